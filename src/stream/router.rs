//! 流式发送路由

use axum::{Router, routing::get};

use super::handlers::stream_bytes;

/// 创建流式发送路由
pub fn create_stream_router() -> Router {
    Router::new().route("/stream", get(stream_bytes))
}
