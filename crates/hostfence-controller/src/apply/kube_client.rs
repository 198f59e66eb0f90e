//! 基于 kube-rs 的集群客户端
//!
//! 通过 API 发现机制解析资源类型，使用 `Api<DynamicObject>` 完成创建与删除，
//! 因此无需为每种自定义资源编写静态类型。

use async_trait::async_trait;
use kube::api::{Api, DeleteParams, DynamicObject, GroupVersionKind, PostParams};
use kube::discovery::Discovery;
use kube::{Client, Config, ResourceExt};
use tracing::{debug, warn};

use hostfence_common::{ApplyAction, Error, Result};

use super::client::{ClusterClient, ObjectKey, ResourceMapping};

/// kube-rs 集群客户端
#[derive(Clone)]
pub struct KubeClusterClient {
    /// Kubernetes 客户端
    client: Client,
}

impl KubeClusterClient {
    /// 使用已有的 Kubernetes 客户端创建
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// 使用 Pod 内的服务账号凭据创建
    pub fn in_cluster() -> Result<Self> {
        let config = Config::incluster()
            .map_err(|e| Error::Credential(format!("读取集群内配置失败: {}", e)))?;
        Self::from_config(config)
    }

    /// 按 kubeconfig / 集群内环境自动推断凭据
    pub async fn infer() -> Result<Self> {
        let config = Config::infer()
            .await
            .map_err(|e| Error::Credential(format!("推断集群配置失败: {}", e)))?;
        Self::from_config(config)
    }

    /// 从客户端配置创建
    pub fn from_config(config: Config) -> Result<Self> {
        let client = Client::try_from(config)
            .map_err(|e| Error::Credential(format!("创建 Kubernetes 客户端失败: {}", e)))?;
        Ok(Self::new(client))
    }

    fn api(&self, mapping: &ResourceMapping, namespace: Option<&str>) -> Api<DynamicObject> {
        match namespace {
            Some(ns) if mapping.is_namespaced() => {
                Api::namespaced_with(self.client.clone(), ns, &mapping.resource)
            }
            _ => Api::all_with(self.client.clone(), &mapping.resource),
        }
    }
}

/// 将 kube 错误转换为下发错误，保留 API 服务器返回的状态码
fn apply_error(action: ApplyAction, name: &str, err: kube::Error) -> Error {
    let code = match &err {
        kube::Error::Api(response) => Some(response.code),
        _ => None,
    };
    Error::apply(action, name, code, err.to_string())
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    async fn discover(&self, gvk: &GroupVersionKind) -> Result<ResourceMapping> {
        let groups = [gvk.group.as_str()];
        let discovery = Discovery::new(self.client.clone())
            .filter(&groups)
            .run()
            .await
            .map_err(|e| Error::Discovery(format!("获取 API 资源信息失败: {}", e)))?;

        let Some((resource, caps)) = discovery.resolve_gvk(gvk) else {
            warn!(group = %gvk.group, version = %gvk.version, kind = %gvk.kind, "资源类型未在 API 发现结果中");
            return Err(Error::Discovery(format!(
                "未知的资源类型: {}/{} {}",
                gvk.group, gvk.version, gvk.kind
            )));
        };

        debug!(kind = %gvk.kind, plural = %resource.plural, scope = ?caps.scope, "解析 REST 映射");
        Ok(ResourceMapping::new(resource, caps.scope))
    }

    async fn create(&self, mapping: &ResourceMapping, object: &DynamicObject) -> Result<()> {
        let name = object.name_any();
        let api = self.api(mapping, object.metadata.namespace.as_deref());
        api.create(&PostParams::default(), object)
            .await
            .map_err(|e| apply_error(ApplyAction::Create, &name, e))?;
        Ok(())
    }

    async fn delete(&self, mapping: &ResourceMapping, key: &ObjectKey) -> Result<()> {
        let api = self.api(mapping, key.namespace.as_deref());
        api.delete(&key.name, &DeleteParams::default())
            .await
            .map_err(|e| apply_error(ApplyAction::Delete, &key.name, e))?;
        Ok(())
    }
}
