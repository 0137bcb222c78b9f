//! 标准化错误处理
//!
//! 定义项目专用的错误类型

use thiserror::Error;

/// 项目主要错误类型
#[derive(Error, Debug)]
pub enum PortalError {
    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(String),

    /// 网络请求错误
    #[error("Network error: {0}")]
    Network(String),

    /// 邮件投递错误
    #[error("Delivery error: {0}")]
    Delivery(String),

    /// 静态文档加载错误
    #[error("Document error: {0}")]
    Document(String),

    /// 输入验证错误
    #[error("Validation error: {0}")]
    Validation(String),

    /// 资源不存在
    #[error("Not found: {0}")]
    NotFound(String),

    /// 未知错误
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for PortalError {
    fn from(err: anyhow::Error) -> Self {
        PortalError::Unknown(format!("{:#}", err))
    }
}

impl From<std::io::Error> for PortalError {
    fn from(err: std::io::Error) -> Self {
        PortalError::Document(err.to_string())
    }
}

impl From<serde_json::Error> for PortalError {
    fn from(err: serde_json::Error) -> Self {
        PortalError::Document(err.to_string())
    }
}

impl From<reqwest::Error> for PortalError {
    fn from(err: reqwest::Error) -> Self {
        PortalError::Network(err.to_string())
    }
}

/// 项目结果类型别名
pub type Result<T> = std::result::Result<T, PortalError>;
