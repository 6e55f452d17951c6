//! waster-rs：HTTP 带宽测量工具
//!
//! 服务端以 chunked 响应体持续输出填充字节；客户端消费字节流并
//! 统计累计量与吞吐率，测量结果可追加到 JSON 日志文件

pub mod log_store;
pub mod meter;
pub mod model;
pub mod server;
pub mod static_files;
pub mod stream;
