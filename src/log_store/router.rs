//! 测量日志路由

use axum::{
    Router,
    routing::{get, post},
};

use super::handlers::{get_logs, save_log};
use super::store::MeasurementLog;

/// 测量日志路由状态
#[derive(Clone)]
pub struct LogState {
    pub log: MeasurementLog,
}

/// 创建测量日志路由
pub fn create_log_router(log: MeasurementLog) -> Router {
    Router::new()
        .route("/log", post(save_log))
        .route("/logs", get(get_logs))
        .with_state(LogState { log })
}
