//! 策略配置模型
//!
//! 控制器在 setup 与 cleanup 之间保持的状态：网卡名称、完整地址列表，
//! 以及已下发但尚未确认删除的地址集合清单。cleanup 从同一份配置重新渲染两条策略，
//! 因此两次调用之间配置必须保持不变。

use serde::{Deserialize, Serialize};

use super::address::AddressRange;

/// 一条已下发的地址集合清单
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedManifest {
    /// 资源名称
    pub name: String,
    /// 清单文本
    pub text: String,
}

impl AppliedManifest {
    /// 创建新的记录
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// 策略配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// 受控网卡名称
    pub iface: String,
    /// 允许的地址范围（有序）
    pub nets: Vec<AddressRange>,
    /// 已下发的地址集合清单，名称唯一，按下发顺序排列
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address_set_manifests: Vec<AppliedManifest>,
}

impl PolicyConfig {
    /// 创建新的策略配置
    pub fn new(nets: Vec<AddressRange>, iface: impl Into<String>) -> Self {
        Self {
            iface: iface.into(),
            nets,
            address_set_manifests: Vec::new(),
        }
    }

    /// 替换网卡与地址列表；已记录的清单保留，直到被成功删除
    pub fn reset(&mut self, nets: &[AddressRange], iface: &str) {
        self.iface = iface.to_string();
        self.nets = nets.to_vec();
    }

    /// 记录一条已下发的地址集合清单，同名记录被替换
    pub fn retain_manifest(&mut self, manifest: AppliedManifest) {
        match self
            .address_set_manifests
            .iter_mut()
            .find(|m| m.name == manifest.name)
        {
            Some(existing) => *existing = manifest,
            None => self.address_set_manifests.push(manifest),
        }
    }

    /// 取出全部已记录清单
    pub fn take_manifests(&mut self) -> Vec<AppliedManifest> {
        std::mem::take(&mut self.address_set_manifests)
    }

    /// 是否仍有已下发的地址集合
    pub fn is_applied(&self) -> bool {
        !self.address_set_manifests.is_empty()
    }
}
