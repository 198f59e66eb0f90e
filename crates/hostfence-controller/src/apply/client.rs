//! 集群 API 边界
//!
//! 资源下发只需要集群提供三种能力：按 (group, version, kind) 发现 REST 映射、
//! 创建对象、按名称删除对象。生产环境由 kube-rs 实现，测试中可替换为模拟实现。

use async_trait::async_trait;
use kube::api::{DynamicObject, GroupVersionKind};
use kube::discovery::{ApiResource, Scope};

#[cfg(test)]
use mockall::automock;

use hostfence_common::Result;

/// 资源的 REST 映射
#[derive(Debug, Clone)]
pub struct ResourceMapping {
    /// REST 资源描述（含复数路径）
    pub resource: ApiResource,
    /// 集群级或命名空间级
    pub scope: Scope,
}

impl ResourceMapping {
    /// 创建新的 REST 映射
    pub fn new(resource: ApiResource, scope: Scope) -> Self {
        Self { resource, scope }
    }

    /// 是否为命名空间级资源
    pub fn is_namespaced(&self) -> bool {
        matches!(self.scope, Scope::Namespaced)
    }
}

/// 待删除对象的标识
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectKey {
    /// 资源名称
    pub name: String,
    /// 命名空间，集群级资源为空
    pub namespace: Option<String>,
}

/// 集群客户端抽象
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// 查询集群的资源发现信息，解析出 REST 映射
    async fn discover(&self, gvk: &GroupVersionKind) -> Result<ResourceMapping>;

    /// 创建对象
    async fn create(&self, mapping: &ResourceMapping, object: &DynamicObject) -> Result<()>;

    /// 按名称（及命名空间）删除对象
    async fn delete(&self, mapping: &ResourceMapping, key: &ObjectKey) -> Result<()>;
}
