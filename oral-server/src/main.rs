//! 口腔AI报告解读服务主程序

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use oral_core::{AppConfig, PatientInfo};
use oral_interpret::ReportInterpreter;
use oral_tasks::{AnalysisProcessor, InMemoryTaskStore};
use oral_web::WebServer;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

/// 服务命令行参数
#[derive(Parser, Debug)]
#[command(name = "oral-server")]
#[command(about = "口腔AI分析报告解读服务")]
struct Args {
    /// 配置文件路径
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// 日志级别，覆盖配置文件
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 启动HTTP服务
    Serve {
        /// 监听主机
        #[arg(long)]
        host: Option<String>,

        /// 监听端口
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// 解读本地的第三方分析结果文件并输出报告
    Interpret {
        /// 第三方AI原始结果（JSON文件）
        #[arg(short, long)]
        file: PathBuf,

        /// 分析类型
        #[arg(short, long)]
        analysis_type: String,

        /// 患者ID
        #[arg(long)]
        patient_id: String,

        /// 患者年龄
        #[arg(long)]
        age: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 日志系统在配置加载后才初始化，加载失败由返回的错误报告
    let mut config = AppConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(config.logging.level.as_str())
        .with_writer(std::io::stderr)
        .init();

    info!(
        "Configuration loaded from {}",
        args.config.as_deref().unwrap_or("<defaults>")
    );

    let interpreter = Arc::new(ReportInterpreter::new(&config.interpreter));

    match args.command.unwrap_or(Command::Serve { host: None, port: None }) {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate()?;
            serve(config, interpreter).await
        }
        Command::Interpret {
            file,
            analysis_type,
            patient_id,
            age,
        } => {
            let patient = PatientInfo::new(patient_id, age);
            interpret(&interpreter, &file, &analysis_type, patient).await
        }
    }
}

async fn serve(config: AppConfig, interpreter: Arc<ReportInterpreter>) -> Result<()> {
    info!("启动口腔AI报告解读服务...");
    info!("  监听地址: {}:{}", config.server.host, config.server.port);
    info!("  置信度阈值: {}", config.interpreter.confidence_threshold);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid listen address")?;

    let processor = AnalysisProcessor::new(Arc::new(InMemoryTaskStore::new()), interpreter)
        .with_default_list_limit(config.tasks.default_list_limit);

    let server = WebServer::new(addr, Arc::new(processor));
    if let Err(e) = server.run().await {
        error!("服务器启动失败: {}", e);
        return Err(e.into());
    }

    Ok(())
}

async fn interpret(
    interpreter: &ReportInterpreter,
    file: &Path,
    analysis_type: &str,
    patient: PatientInfo,
) -> Result<()> {
    let content = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let raw_result: serde_json::Value =
        serde_json::from_str(&content).context("Analysis result is not valid JSON")?;

    let report = interpreter.build_report(&raw_result, analysis_type, &patient)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
