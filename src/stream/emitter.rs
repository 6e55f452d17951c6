//! 填充字节流发送器
//!
//! 以 64 KiB 为单位产出内容无关的填充字节，直到达到目标字节数或
//! 消费方断开。流是拉取驱动的：只有当传输层能继续写出时才会被
//! poll，因此服务端在任意时刻最多持有一个未写出的块，内存占用与
//! 客户端的消费速度无关。

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::task::{Context, Poll};
use std::time::Instant;

use bytes::Bytes;
use futures::Stream;
use uuid::Uuid;

/// 单个块的大小（64 KiB）
pub const CHUNK_SIZE: usize = 64 * 1024;

/// 所有会话共享的填充缓冲区，按需切片
static FILLER: [u8; CHUNK_SIZE] = [b'a'; CHUNK_SIZE];

/// 流的目标字节数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteTarget {
    /// 不限量，持续发送直到消费方断开
    Unbounded,
    /// 发送指定字节数后正常结束
    Bytes(u64),
}

impl ByteTarget {
    /// 从 `mb` 查询参数解析目标字节数
    ///
    /// 缺失、非数字、零或负数都视为不限量；正数按
    /// `floor(mb × 1024 × 1024)` 换算为字节
    pub fn from_mb_param(raw: Option<&str>) -> Self {
        match raw.and_then(|s| s.trim().parse::<f64>().ok()) {
            Some(mb) if mb > 0.0 => ByteTarget::Bytes((mb * 1024.0 * 1024.0).floor() as u64),
            _ => ByteTarget::Unbounded,
        }
    }
}

/// 一次流式发送的会话状态
///
/// `bytes_sent` 单调递增，仅用于服务端日志，不暴露给客户端；
/// 客户端在自己一侧计数，连接中断时两者可以合理地不一致
pub struct StreamSession {
    pub id: Uuid,
    pub target: ByteTarget,
    bytes_sent: AtomicU64,
    completed: AtomicBool,
    started: Instant,
}

impl StreamSession {
    pub fn new(target: ByteTarget) -> Self {
        Self {
            id: Uuid::new_v4(),
            target,
            bytes_sent: AtomicU64::new(0),
            completed: AtomicBool::new(false),
            started: Instant::now(),
        }
    }

    /// 已发送的字节数
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent.load(Ordering::Relaxed)
    }
}

/// 填充字节流
///
/// 每次 poll 产出一个块；达到有限目标后结束，不限量时由消费方
/// 断开（流被 drop）终止。传输层写失败同样表现为 drop，无需单独处理
pub struct FillerStream {
    session: Arc<StreamSession>,
}

impl FillerStream {
    pub fn new(session: Arc<StreamSession>) -> Self {
        Self { session }
    }
}

impl Stream for FillerStream {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let session = &self.session;
        let sent = session.bytes_sent.load(Ordering::Relaxed);

        let len = match session.target {
            ByteTarget::Unbounded => CHUNK_SIZE,
            ByteTarget::Bytes(target) => {
                if sent >= target {
                    session.completed.store(true, Ordering::Relaxed);
                    tracing::info!(
                        session_id = %session.id,
                        bytes_sent = sent,
                        duration_ms = session.started.elapsed().as_millis() as u64,
                        "流式发送完成"
                    );
                    return Poll::Ready(None);
                }
                (target - sent).min(CHUNK_SIZE as u64) as usize
            }
        };

        session.bytes_sent.fetch_add(len as u64, Ordering::Relaxed);
        Poll::Ready(Some(Ok(Bytes::from_static(&FILLER[..len]))))
    }
}

impl Drop for FillerStream {
    fn drop(&mut self) {
        if !self.session.completed.load(Ordering::Relaxed) {
            tracing::debug!(
                session_id = %self.session.id,
                bytes_sent = self.session.bytes_sent(),
                duration_ms = self.session.started.elapsed().as_millis() as u64,
                "客户端断开，流式发送中止"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn finite_stream(bytes: u64) -> (FillerStream, Arc<StreamSession>) {
        let session = Arc::new(StreamSession::new(ByteTarget::Bytes(bytes)));
        (FillerStream::new(session.clone()), session)
    }

    #[test]
    fn test_mb_param_parsing() {
        assert_eq!(ByteTarget::from_mb_param(None), ByteTarget::Unbounded);
        assert_eq!(ByteTarget::from_mb_param(Some("")), ByteTarget::Unbounded);
        assert_eq!(ByteTarget::from_mb_param(Some("abc")), ByteTarget::Unbounded);
        assert_eq!(ByteTarget::from_mb_param(Some("0")), ByteTarget::Unbounded);
        assert_eq!(ByteTarget::from_mb_param(Some("-3")), ByteTarget::Unbounded);
        assert_eq!(
            ByteTarget::from_mb_param(Some("1")),
            ByteTarget::Bytes(1_048_576)
        );
        // 小数按 floor 换算
        assert_eq!(
            ByteTarget::from_mb_param(Some("0.5")),
            ByteTarget::Bytes(524_288)
        );
    }

    /// 有限目标必须精确发送 floor(mb × 1024 × 1024) 字节
    #[tokio::test]
    async fn test_finite_stream_exact_bytes() {
        let (stream, session) = finite_stream(1_048_576);
        let chunks: Vec<_> = stream.collect().await;
        let total: usize = chunks.iter().map(|c| c.as_ref().unwrap().len()).sum();
        assert_eq!(total, 1_048_576);
        assert_eq!(chunks.len(), 16);
        assert_eq!(session.bytes_sent(), 1_048_576);
    }

    /// 最后一个块按剩余量截断
    #[tokio::test]
    async fn test_last_chunk_is_truncated() {
        let (stream, _) = finite_stream(100_000);
        let sizes: Vec<usize> = stream.map(|c| c.unwrap().len()).collect().await;
        assert_eq!(sizes, vec![65_536, 34_464]);
    }

    /// 块只在被拉取时产出：未 poll 之前不计任何字节
    #[tokio::test]
    async fn test_chunks_are_produced_on_demand() {
        let (mut stream, session) = finite_stream(1_048_576);
        assert_eq!(session.bytes_sent(), 0);

        let chunk = stream.next().await.unwrap().unwrap();
        assert_eq!(chunk.len(), CHUNK_SIZE);
        assert_eq!(session.bytes_sent(), CHUNK_SIZE as u64);
    }

    /// 不限量的流持续产出完整块
    #[tokio::test]
    async fn test_unbounded_stream_keeps_producing() {
        let session = Arc::new(StreamSession::new(ByteTarget::Unbounded));
        let mut stream = FillerStream::new(session.clone());
        for _ in 0..5 {
            let chunk = stream.next().await.unwrap().unwrap();
            assert_eq!(chunk.len(), CHUNK_SIZE);
        }
        assert_eq!(session.bytes_sent(), 5 * CHUNK_SIZE as u64);
    }

    #[tokio::test]
    async fn test_filler_content() {
        let (mut stream, _) = finite_stream(16);
        let chunk = stream.next().await.unwrap().unwrap();
        assert_eq!(chunk.len(), 16);
        assert!(chunk.iter().all(|&b| b == b'a'));
        assert!(stream.next().await.is_none());
    }

    /// 提前 drop（模拟客户端断开）后计数停在已发送的位置
    #[tokio::test]
    async fn test_drop_mid_stream_stops_counting() {
        let (mut stream, session) = finite_stream(10 * 1_048_576);
        for _ in 0..3 {
            stream.next().await.unwrap().unwrap();
        }
        drop(stream);
        assert_eq!(session.bytes_sent(), 3 * CHUNK_SIZE as u64);
    }
}
