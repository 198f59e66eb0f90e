//! 清单渲染模块
//!
//! 将策略描述渲染为 Calico 自定义资源清单。内置三种模板：地址集合、
//! 通用策略与工作负载策略。

mod renderer;

pub use renderer::{AddressSetData, ManifestRenderer, PolicyData, TemplateSources};
