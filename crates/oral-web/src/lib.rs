//! # Web服务模块
//!
//! 提供分析任务提交、查询和报告解读的HTTP接口

pub mod error;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use server::{create_app, AppState, WebServer};
