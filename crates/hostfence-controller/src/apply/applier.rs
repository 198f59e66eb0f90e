//! 动态资源下发器
//!
//! 将一条清单文本解码为无模式对象，按其 apiVersion/kind 在集群的实时资源模式中
//! 解析 REST 映射，补齐命名空间后执行创建或删除。不做重试，也不缓存发现结果。

use kube::api::{DynamicObject, GroupVersionKind};
use kube::ResourceExt;
use tracing::{debug, info};

use hostfence_common::{ApplyAction, Error, Result};

use super::client::{ClusterClient, ObjectKey};

/// 命名空间级资源未指定命名空间时使用的默认值
pub const DEFAULT_FALLBACK_NAMESPACE: &str = "default";

/// 将清单文本解码为单个无模式对象
///
/// 同时接受 YAML 与 JSON。多文档、非映射文档，或缺少 apiVersion / kind /
/// metadata.name 时返回解码错误。
pub fn decode_manifest(manifest: &str) -> Result<DynamicObject> {
    let value: serde_json::Value = serde_yaml::from_str(manifest)
        .map_err(|e| Error::Decode(format!("解析 YAML 失败: {}", e)))?;

    if !value.is_object() {
        return Err(Error::Decode("清单必须是一个映射对象".to_string()));
    }

    let object: DynamicObject = serde_json::from_value(value)
        .map_err(|e| Error::Decode(format!("转换为无模式对象失败: {}", e)))?;

    if object.types.is_none() {
        return Err(Error::Decode("清单缺少 apiVersion 或 kind".to_string()));
    }
    if object.metadata.name.as_deref().unwrap_or_default().is_empty() {
        return Err(Error::Decode("清单缺少 metadata.name".to_string()));
    }

    Ok(object)
}

/// 提取对象的 group / version / kind
pub fn group_version_kind(object: &DynamicObject) -> Result<GroupVersionKind> {
    let types = object
        .types
        .as_ref()
        .ok_or_else(|| Error::Decode("清单缺少 apiVersion 或 kind".to_string()))?;

    if types.kind.is_empty() {
        return Err(Error::Decode("清单 kind 为空".to_string()));
    }

    let (group, version) = match types.api_version.split_once('/') {
        Some((group, version)) => (group, version),
        None => ("", types.api_version.as_str()),
    };
    if version.is_empty() {
        return Err(Error::Decode(format!("无效的 apiVersion: {}", types.api_version)));
    }

    Ok(GroupVersionKind::gvk(group, version, &types.kind))
}

/// 动态资源下发器
pub struct ResourceApplier<C> {
    /// 集群客户端
    client: C,
    /// 默认命名空间
    fallback_namespace: String,
}

impl<C: ClusterClient> ResourceApplier<C> {
    /// 创建新的下发器
    pub fn new(client: C) -> Self {
        Self {
            client,
            fallback_namespace: DEFAULT_FALLBACK_NAMESPACE.to_string(),
        }
    }

    /// 设置默认命名空间
    pub fn with_fallback_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.fallback_namespace = namespace.into();
        self
    }

    /// 获取集群客户端
    pub fn client(&self) -> &C {
        &self.client
    }

    /// 下发一条清单
    pub async fn apply(&self, manifest: &str, action: ApplyAction) -> Result<()> {
        let mut object = decode_manifest(manifest)?;
        let gvk = group_version_kind(&object)?;

        // 每次调用都重新发现，集群中的 CRD 可能随时变化
        let mapping = self.client.discover(&gvk).await?;

        let namespace_missing = object.metadata.namespace.as_deref().unwrap_or_default().is_empty();
        if mapping.is_namespaced() && namespace_missing {
            object.metadata.namespace = Some(self.fallback_namespace.clone());
        }

        let name = object.name_any();
        debug!(
            kind = %gvk.kind,
            name = %name,
            namespace = ?object.metadata.namespace,
            %action,
            "下发资源"
        );

        match action {
            ApplyAction::Create => self.client.create(&mapping, &object).await?,
            ApplyAction::Delete => {
                let key = ObjectKey {
                    name: name.clone(),
                    namespace: object.metadata.namespace.clone(),
                };
                self.client.delete(&mapping, &key).await?
            }
        }

        info!("{} {} {} 成功", action, gvk.kind, name);
        Ok(())
    }
}
