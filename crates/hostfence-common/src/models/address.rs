//! 地址范围模型
//!
//! 以 CIDR 形式表示的单个 IP 网络。构造时即完成校验，之后不可变。

use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use crate::error::{Error, Result};

/// CIDR 地址范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AddressRange(IpNet);

impl AddressRange {
    /// 从已解析的网络创建
    pub fn new(net: IpNet) -> Self {
        Self(net)
    }

    /// 单个主机地址（/32 或 /128）
    pub fn host(addr: IpAddr) -> Self {
        Self(IpNet::from(addr))
    }

    /// 底层网络
    pub fn net(&self) -> IpNet {
        self.0
    }

    /// 前缀长度
    pub fn prefix_len(&self) -> u8 {
        self.0.prefix_len()
    }
}

impl FromStr for AddressRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(net) = s.parse::<IpNet>() {
            return Ok(Self(net));
        }
        // 不带前缀的地址按主机路由处理
        s.parse::<IpAddr>()
            .map(Self::host)
            .map_err(|_| Error::InvalidAddress(s.to_string()))
    }
}

impl TryFrom<String> for AddressRange {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<AddressRange> for String {
    fn from(range: AddressRange) -> Self {
        range.to_string()
    }
}

impl From<IpNet> for AddressRange {
    fn from(net: IpNet) -> Self {
        Self(net)
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 批量解析地址列表，遇到第一个无效条目即返回错误
pub fn parse_ranges<I, S>(items: I) -> Result<Vec<AddressRange>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items.into_iter().map(|s| s.as_ref().parse()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cidr() {
        let range: AddressRange = "10.0.0.0/8".parse().unwrap();
        assert_eq!(range.to_string(), "10.0.0.0/8");
        assert_eq!(range.prefix_len(), 8);

        let v6: AddressRange = "fd00::/64".parse().unwrap();
        assert_eq!(v6.to_string(), "fd00::/64");
    }

    #[test]
    fn test_bare_address_becomes_host_range() {
        let v4: AddressRange = "192.168.1.7".parse().unwrap();
        assert_eq!(v4.to_string(), "192.168.1.7/32");

        let v6: AddressRange = "::1".parse().unwrap();
        assert_eq!(v6.to_string(), "::1/128");
    }

    #[test]
    fn test_invalid_address() {
        assert!(matches!(
            "not-an-ip".parse::<AddressRange>(),
            Err(Error::InvalidAddress(_))
        ));
        assert!("10.0.0.0/33".parse::<AddressRange>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let range: AddressRange = "172.16.0.0/12".parse().unwrap();
        let json = serde_json::to_string(&range).unwrap();
        assert_eq!(json, "\"172.16.0.0/12\"");

        let back: AddressRange = serde_json::from_str(&json).unwrap();
        assert_eq!(back, range);

        assert!(serde_json::from_str::<AddressRange>("\"bogus\"").is_err());
    }

    #[test]
    fn test_parse_ranges_keeps_order() {
        let ranges = parse_ranges(["10.0.0.1", "10.0.0.0/24", "10.0.0.2"]).unwrap();
        let printed: Vec<String> = ranges.iter().map(ToString::to_string).collect();
        assert_eq!(printed, vec!["10.0.0.1/32", "10.0.0.0/24", "10.0.0.2/32"]);

        assert!(parse_ranges(["10.0.0.1", "oops"]).is_err());
    }
}
