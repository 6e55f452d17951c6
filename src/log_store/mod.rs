//! 测量日志持久化模块
//!
//! 把测量结果追加到单个 JSON 数组文件，并通过 HTTP 暴露读写端点

mod handlers;
mod router;
pub mod store;

pub use router::create_log_router;
pub use store::MeasurementLog;
