//! 策略管理模块
//!
//! 编排地址分片、清单渲染与资源下发，实现过滤规则的安装与移除。

mod controller;
mod report;

pub use controller::{render_manifests, ControllerSettings, PolicyController, RenderedManifest, TrafficFilter};
pub use report::{CleanupOutcome, CleanupReport};
