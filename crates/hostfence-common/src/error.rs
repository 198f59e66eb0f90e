//! 错误处理模块
//!
//! 该模块提供 HostFence 项目的统一错误处理机制。错误种类与策略下发流程的各个阶段一一对应：
//! 模板渲染、清单解码、资源发现、资源创建/删除以及集群凭据。

use std::io;
use thiserror::Error;

use crate::models::manifest::ApplyAction;

/// HTTP 409，资源已存在
const STATUS_CONFLICT: u16 = 409;
/// HTTP 404，资源不存在
const STATUS_NOT_FOUND: u16 = 404;

/// HostFence 统一错误类型
#[derive(Error, Debug)]
pub enum Error {
    /// 模板语法错误或模板引用了缺失字段
    #[error("模板错误: {0}")]
    Template(String),

    /// 清单文档格式错误
    #[error("清单解码错误: {0}")]
    Decode(String),

    /// 无法获取集群资源模式，或资源类型未知
    #[error("资源发现错误: {0}")]
    Discovery(String),

    /// 集群拒绝了创建/删除请求
    #[error("{action} 资源 {name} 失败: {message}")]
    Apply {
        /// 执行的动作
        action: ApplyAction,
        /// 资源名称
        name: String,
        /// API 服务器返回的状态码（若有）
        code: Option<u16>,
        /// 底层错误信息
        message: String,
    },

    /// 无法建立集群身份
    #[error("集群凭据错误: {0}")]
    Credential(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 无效的地址范围
    #[error("无效的地址范围: {0}")]
    InvalidAddress(String),

    /// I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// 构造资源下发错误
    pub fn apply(
        action: ApplyAction,
        name: impl Into<String>,
        code: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        Error::Apply {
            action,
            name: name.into(),
            code,
            message: message.into(),
        }
    }

    /// 是否为“资源已存在”
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Error::Apply { code: Some(STATUS_CONFLICT), .. })
    }

    /// 是否为“资源不存在”
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Apply { code: Some(STATUS_NOT_FOUND), .. })
    }
}

/// HostFence 结果类型别名
pub type Result<T> = std::result::Result<T, Error>;

/// 从字符串创建错误
pub trait IntoError<T> {
    /// 将当前类型转换为错误
    fn into_error(self, kind: fn(String) -> Error) -> Result<T>;
}

impl<T> IntoError<T> for String {
    fn into_error(self, kind: fn(String) -> Error) -> Result<T> {
        Err(kind(self))
    }
}

impl<T> IntoError<T> for &str {
    fn into_error(self, kind: fn(String) -> Error) -> Result<T> {
        Err(kind(self.to_string()))
    }
}
