//! 错误定义模块

use thiserror::Error;

/// 口腔AI分析服务统一错误类型
#[derive(Error, Debug)]
pub enum OralError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("验证错误: {0}")]
    Validation(String),

    #[error("分析结果格式错误: {0}")]
    MalformedInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("无效状态转换: 从 {from} 到 {event}")]
    InvalidStateTransition { from: String, event: String },

    #[error("系统内部错误: {0}")]
    Internal(String),
}

impl From<::config::ConfigError> for OralError {
    fn from(err: ::config::ConfigError) -> Self {
        OralError::Config(err.to_string())
    }
}

/// 口腔AI分析服务统一结果类型
pub type Result<T> = std::result::Result<T, OralError>;
