//! 字节流发送模块
//!
//! 核心是 [`emitter::FillerStream`]：按需产出固定大小的填充字节块，
//! 由 HTTP 层的拉取节奏提供背压

pub mod emitter;
mod handlers;
mod router;

pub use emitter::{ByteTarget, CHUNK_SIZE, FillerStream, StreamSession};
pub use router::create_stream_router;
