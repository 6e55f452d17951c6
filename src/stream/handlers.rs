//! 流式发送处理器

use std::sync::Arc;

use axum::{
    body::Body,
    extract::Query,
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::emitter::{ByteTarget, FillerStream, StreamSession};

/// GET /stream 查询参数
#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    /// 请求的数据量（MB），宽松解析：缺失或非法值等同于不限量
    pub mb: Option<String>,
}

/// GET /stream
///
/// 以 chunked 响应体持续输出填充字节；`mb > 0` 时发送
/// `floor(mb × 1024 × 1024)` 字节后关闭，否则持续到客户端断开
pub async fn stream_bytes(Query(query): Query<StreamQuery>) -> Response {
    let target = ByteTarget::from_mb_param(query.mb.as_deref());
    let session = Arc::new(StreamSession::new(target));
    tracing::info!(session_id = %session.id, target = ?target, "开始流式发送");

    (
        [
            (header::CONTENT_TYPE, "application/octet-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(FillerStream::new(session)),
    )
        .into_response()
}
