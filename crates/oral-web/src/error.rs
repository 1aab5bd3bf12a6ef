//! HTTP错误响应

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use oral_core::OralError;
use serde_json::json;

/// 接口错误，包装核心错误并映射为HTTP状态码
#[derive(Debug)]
pub struct ApiError(pub OralError);

impl From<OralError> for ApiError {
    fn from(err: OralError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            OralError::NotFound(_) => StatusCode::NOT_FOUND,
            OralError::Validation(_) => StatusCode::BAD_REQUEST,
            OralError::MalformedInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            OralError::InvalidStateTransition { .. } => StatusCode::CONFLICT,
            OralError::Config(_)
            | OralError::Serialization(_)
            | OralError::Io(_)
            | OralError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        } else {
            tracing::warn!("Request rejected: {}", self.0);
        }

        let body = Json(json!({
            "error": true,
            "message": self.0.to_string(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}
