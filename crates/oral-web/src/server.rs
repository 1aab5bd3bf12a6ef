//! Web服务器

use axum::{
    routing::{get, post},
    Router,
};
use oral_core::Result;
use oral_tasks::AnalysisProcessor;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::handlers::{
    api_root, delete_analysis, get_analysis, health, interpret_report, list_analysis_tasks,
    submit_analysis, supported_types,
};

/// 共享应用状态
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<AnalysisProcessor>,
}

pub struct WebServer {
    addr: SocketAddr,
    app: Router,
}

impl WebServer {
    pub fn new(addr: SocketAddr, processor: Arc<AnalysisProcessor>) -> Self {
        let app = create_app(AppState { processor });
        Self { addr, app }
    }

    pub async fn run(self) -> Result<()> {
        info!("Starting web server on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        axum::serve(listener, self.app).await?;

        Ok(())
    }
}

/// 构建路由
pub fn create_app(state: AppState) -> Router {
    Router::new()
        // 根路径
        .route("/", get(api_root))
        // 健康检查
        .route("/health", get(health))
        // API路由
        .nest("/api/v1", api_routes())
        .with_state(state)
        // 全局中间件
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
}

/// API v1 路由
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(api_root))
        .route("/analysis", post(submit_analysis).get(list_analysis_tasks))
        .route("/analysis/:task_id", get(get_analysis).delete(delete_analysis))
        .route("/analysis-types", get(supported_types))
        .route("/reports/interpret", post(interpret_report))
}
