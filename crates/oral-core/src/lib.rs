//! # Oral Core
//!
//! 口腔AI分析服务的核心模块，提供基础数据结构、错误定义、配置和通用工具。

pub mod config;
pub mod error;
pub mod models;
pub mod utils;

pub use config::AppConfig;
pub use error::{OralError, Result};
pub use models::*;
