//! # 分析任务模块
//!
//! - 任务状态机：处理中 → 已完成 / 失败
//! - 任务存储：可注入的存储接口与内存实现
//! - 任务处理器：调用报告解读并记录结果

pub mod processor;
pub mod store;
pub mod task;

pub use processor::{AnalysisProcessor, AnalysisRequest};
pub use store::{InMemoryTaskStore, TaskStore};
pub use task::{AnalysisTask, TaskEvent, TaskFilter, TaskStateMachine, TaskStatus};
