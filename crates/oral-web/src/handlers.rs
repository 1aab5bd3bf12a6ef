//! HTTP处理器

use crate::error::ApiError;
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
};
use oral_core::{AnalysisType, PatientInfo};
use oral_interpret::Report;
use oral_tasks::{AnalysisRequest, AnalysisTask, TaskFilter, TaskStatus};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

/// API根路径处理器
pub async fn api_root() -> impl IntoResponse {
    Json(json!({
        "service": "Oral AI Report Interpretation API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "endpoints": {
            "health": "/health",
            "api": "/api/v1"
        }
    }))
}

/// 健康检查处理器
pub async fn health(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let processor = &state.processor;
    let processing = processor.count_by_status(TaskStatus::Processing).await?;
    let completed = processor.count_by_status(TaskStatus::Completed).await?;
    let failed = processor.count_by_status(TaskStatus::Failed).await?;

    Ok(Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "tasks": {
            "processing": processing,
            "completed": completed,
            "failed": failed
        }
    })))
}

/// 分析结果提交请求体
#[derive(Debug, Deserialize)]
pub struct SubmitAnalysisBody {
    #[serde(flatten)]
    pub request: AnalysisRequest,
    pub raw_result: Value,
}

/// 提交第三方分析结果并生成解读报告
pub async fn submit_analysis(
    State(state): State<AppState>,
    Json(body): Json<SubmitAnalysisBody>,
) -> Result<Json<AnalysisTask>, ApiError> {
    info!(
        "Submitting {} analysis for patient {}",
        body.request.analysis_type, body.request.patient_id
    );

    let task = state
        .processor
        .process(&body.request, body.raw_result)
        .await?;
    Ok(Json(task))
}

/// 任务查询参数
#[derive(Debug, Deserialize)]
pub struct TaskQueryParams {
    pub patient_id: Option<String>,
    pub analysis_type: Option<String>,
    pub status: Option<TaskStatus>,
    pub limit: Option<usize>,
}

/// 列出分析任务
pub async fn list_analysis_tasks(
    State(state): State<AppState>,
    Query(params): Query<TaskQueryParams>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Listing analysis tasks with query: {:?}", params);

    let tasks = state
        .processor
        .list_tasks(TaskFilter {
            patient_id: params.patient_id,
            analysis_type: params.analysis_type,
            status: params.status,
            limit: params.limit,
        })
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "total": tasks.len(),
            "tasks": tasks
        }
    })))
}

/// 获取分析任务
pub async fn get_analysis(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<AnalysisTask>, ApiError> {
    let task = state.processor.get_task(&task_id).await?;
    Ok(Json(task))
}

/// 删除分析任务
pub async fn delete_analysis(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.processor.delete_task(&task_id).await?;
    info!("删除分析任务: {}", task_id);

    Ok(Json(json!({
        "success": true,
        "message": "分析任务已删除"
    })))
}

/// 支持的分析类型
pub async fn supported_types() -> impl IntoResponse {
    let names = |types: Vec<AnalysisType>| -> Vec<String> {
        types.into_iter().map(String::from).collect()
    };

    Json(json!({
        "success": true,
        "data": {
            "2d": names(AnalysisType::supported_2d()),
            "3d": names(AnalysisType::supported_3d())
        }
    }))
}

/// 报告解读请求体
#[derive(Debug, Deserialize)]
pub struct InterpretBody {
    pub analysis_type: String,
    pub patient: PatientInfo,
    pub raw_result: Value,
}

/// 无状态报告解读
pub async fn interpret_report(
    State(state): State<AppState>,
    Json(body): Json<InterpretBody>,
) -> Result<Json<Report>, ApiError> {
    let report = state.processor.interpreter().build_report(
        &body.raw_result,
        &body.analysis_type,
        &body.patient,
    )?;
    Ok(Json(report))
}
