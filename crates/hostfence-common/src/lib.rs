//! HostFence Common - 跨模块共享的数据结构与错误类型
//!
//! 该模块提供 HostFence 项目中所有组件共享的数据结构和统一的错误处理机制，
//! 包括地址范围、分片算法、清单种类以及策略配置。

pub mod models;
pub mod error;

/// 重新导出常用类型，方便使用
pub use error::Error;
pub use error::Result;
pub use models::address::*;
pub use models::chunk::*;
pub use models::manifest::*;
pub use models::policy::*;
