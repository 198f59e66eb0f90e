//! HostFence 控制平面
//!
//! 通过 Calico 自定义资源在主机网卡上安装流量过滤规则。
//! 地址列表先被分片，再渲染为清单，最后经 kube-rs 动态下发到集群。

pub mod apply;
pub mod manifest;
pub mod policy;
pub mod utils;

pub use apply::{ClusterClient, KubeClusterClient, ResourceApplier};
pub use manifest::{ManifestRenderer, TemplateSources};
pub use policy::{CleanupReport, ControllerSettings, PolicyController, RenderedManifest, TrafficFilter};
