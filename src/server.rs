//! HTTP 服务装配

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::log_store::{MeasurementLog, create_log_router};
use crate::model::config::Config;
use crate::static_files::static_handler;
use crate::stream::create_stream_router;

/// CORS 中间件层
///
/// 公开服务，允许任意来源、方法与请求头
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// 组装完整应用路由
pub fn create_app(log: MeasurementLog) -> Router {
    Router::new()
        .merge(create_stream_router())
        .merge(create_log_router(log))
        .fallback(static_handler)
        .layer(cors_layer())
}

/// 启动 HTTP 服务
pub async fn run(config: &Config) -> Result<()> {
    let log = MeasurementLog::new(&config.log_file)
        .with_context(|| format!("打开日志文件失败: {}", config.log_file))?;
    let app = create_app(log);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("监听地址失败: {}", addr))?;
    tracing::info!("带宽测量服务已启动: http://{}", addr);
    axum::serve(listener, app)
        .await
        .context("HTTP 服务异常退出")?;
    Ok(())
}
