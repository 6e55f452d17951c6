//! 测量日志处理器

use axum::{
    body::Bytes,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
};

use crate::model::summary::MeasurementSummary;

use super::router::LogState;

/// POST /log
///
/// 请求体为一条 JSON 格式的测量结果；空请求体返回 400
pub async fn save_log(State(state): State<LogState>, body: Bytes) -> Response {
    if body.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "No JSON body provided"})),
        )
            .into_response();
    }

    let entry: MeasurementSummary = match serde_json::from_slice(&body) {
        Ok(entry) => entry,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": format!("Invalid JSON body: {}", e)})),
            )
                .into_response();
        }
    };

    match state.log.append(entry).await {
        Ok(()) => Json(serde_json::json!({"status": "ok"})).into_response(),
        Err(e) => {
            tracing::error!("保存测量日志失败: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Failed to save log"})),
            )
                .into_response()
        }
    }
}

/// GET /logs
///
/// 原样返回持久化的 JSON 数组
pub async fn get_logs(State(state): State<LogState>) -> Response {
    match state.log.read_raw().await {
        Ok(raw) => ([(header::CONTENT_TYPE, "application/json")], raw).into_response(),
        Err(e) => {
            tracing::error!("读取测量日志失败: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Failed to read logs"})),
            )
                .into_response()
        }
    }
}
