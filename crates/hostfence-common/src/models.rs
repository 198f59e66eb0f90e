//! 数据模型模块
//!
//! 该模块定义了 HostFence 项目中使用的核心数据模型：地址范围、分片、
//! 清单种类与策略配置。

pub mod address;
pub mod chunk;
pub mod manifest;
pub mod policy;
