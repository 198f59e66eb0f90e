//! 资源清单模型
//!
//! 定义清单种类、下发动作以及由固定前缀派生的确定性资源名称。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// 默认资源名称前缀
pub const DEFAULT_NAME_PREFIX: &str = "hostfence";

/// 下发动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplyAction {
    /// 创建资源
    Create,
    /// 按名称删除资源
    Delete,
}

impl fmt::Display for ApplyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyAction::Create => write!(f, "create"),
            ApplyAction::Delete => write!(f, "delete"),
        }
    }
}

impl FromStr for ApplyAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "create" => Ok(ApplyAction::Create),
            "delete" => Ok(ApplyAction::Delete),
            _ => Err(Error::Config(format!("无效的下发动作: {}", s))),
        }
    }
}

/// 清单种类，每种对应一个固定模板
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ManifestKind {
    /// 允许地址集合（按分片生成多个）
    AddressSet,
    /// 作用于主机网卡的通用策略
    GeneralPolicy,
    /// 作用于工作负载间流量的策略
    WorkloadPolicy,
}

impl ManifestKind {
    /// 所有清单种类
    pub const ALL: [ManifestKind; 3] = [
        ManifestKind::AddressSet,
        ManifestKind::GeneralPolicy,
        ManifestKind::WorkloadPolicy,
    ];

    /// 模板名称，同时也是覆盖模板的文件名主干
    pub fn template_name(&self) -> &'static str {
        match self {
            ManifestKind::AddressSet => "address-set",
            ManifestKind::GeneralPolicy => "general-policy",
            ManifestKind::WorkloadPolicy => "workload-policy",
        }
    }
}

impl fmt::Display for ManifestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.template_name())
    }
}

/// 第 `index` 个地址集合的资源名称
pub fn address_set_name(prefix: &str, index: usize) -> String {
    format!("{}-netset-{}", prefix, index)
}

/// 通用策略的资源名称
pub fn general_policy_name(prefix: &str) -> String {
    format!("{}-host", prefix)
}

/// 工作负载策略的资源名称
pub fn workload_policy_name(prefix: &str) -> String {
    format!("{}-workloads", prefix)
}
