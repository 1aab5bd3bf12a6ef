//! 配置管理
//!
//! 默认值 → 配置文件 → 环境变量（`ORAL__` 前缀）逐层覆盖

use crate::error::{OralError, Result};
use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::error;

/// 服务完整配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AppConfig {
    /// 服务器配置
    pub server: ServerConfig,
    /// 报告解读配置
    pub interpreter: InterpreterConfig,
    /// 任务管理配置
    pub tasks: TaskConfig,
    /// 日志配置
    pub logging: LoggingConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听主机
    pub host: String,
    /// 监听端口
    pub port: u16,
}

/// 报告解读配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InterpreterConfig {
    /// 最低置信度阈值，仅全景片分割和病变检测使用
    pub confidence_threshold: f64,
}

/// 任务管理配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TaskConfig {
    /// 任务列表默认返回条数
    pub default_list_limit: usize,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别过滤表达式
    pub level: String,
}

impl AppConfig {
    /// 加载配置
    ///
    /// 显式指定的配置文件必须存在，失败原因由返回的错误携带。
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&AppConfig::default())?);

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix("ORAL")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 验证配置
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            error!("Configuration validation failed for server.port");
            return Err(OralError::Config("服务端口不能为0".to_string()));
        }

        let threshold = self.interpreter.confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            error!("Configuration validation failed for interpreter.confidence_threshold");
            return Err(OralError::Config(format!(
                "置信度阈值必须在0到1之间: {}",
                threshold
            )));
        }

        if self.tasks.default_list_limit == 0 {
            error!("Configuration validation failed for tasks.default_list_limit");
            return Err(OralError::Config("任务列表条数不能为0".to_string()));
        }

        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.7,
        }
    }
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            default_list_limit: 50,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
