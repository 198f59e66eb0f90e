//! 资源下发模块
//!
//! 该模块负责把渲染好的清单文本下发到集群：解码、动态解析资源类型、
//! 命名空间补齐，以及创建/删除调用。

pub mod client;
mod applier;
mod kube_client;

pub use applier::{decode_manifest, group_version_kind, ResourceApplier, DEFAULT_FALLBACK_NAMESPACE};
pub use client::{ClusterClient, ObjectKey, ResourceMapping};
pub use kube_client::KubeClusterClient;
