//! 客户端吞吐量测量模块
//!
//! 消费 /stream 的响应体并统计累计字节与瞬时速率；单个协作式任务
//! 持有全部会话状态，支持中途停止

mod display;
mod runner;
mod session;

pub use display::{ConsoleDisplay, MeterDisplay, SilentDisplay};
pub use runner::{DEFAULT_SAMPLE_INTERVAL_MS, MeterOptions, MeterOutcome, run_meter, save_summary};
pub use session::{MeterSession, RateSampler};
