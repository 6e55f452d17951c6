//! 测量会话状态

use std::time::Instant;

use crate::model::summary::{BYTES_PER_MB, MeasurementSummary};

/// 一次吞吐量测量的会话状态
///
/// 由测量任务独占持有；计数与采样发生在同一个任务内，
/// 不存在跨线程的读写竞争
#[derive(Debug)]
pub struct MeterSession {
    requested_mb: f64,
    bytes: u64,
    started_at: Instant,
    finished_at: Option<Instant>,
}

impl MeterSession {
    pub fn new(requested_mb: f64) -> Self {
        Self {
            requested_mb,
            bytes: 0,
            started_at: Instant::now(),
            finished_at: None,
        }
    }

    /// 记录一个到达的数据块
    pub fn record_chunk(&mut self, len: usize) {
        self.bytes += len as u64;
    }

    /// 累计接收字节数
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// 累计接收量（MB）
    pub fn megabytes(&self) -> f64 {
        self.bytes as f64 / BYTES_PER_MB
    }

    /// 是否仍在测量中
    pub fn is_active(&self) -> bool {
        self.finished_at.is_none()
    }

    /// 冻结结束时间；重复调用只保留第一次
    pub fn finish(&mut self) {
        if self.finished_at.is_none() {
            self.finished_at = Some(Instant::now());
        }
    }

    /// 计算汇总结果
    ///
    /// 仍在测量中时以当前时刻作为临时结束点；会话结束后，对同一
    /// timestamp 的重复调用返回完全相同的结果
    pub fn summary(&self, timestamp: String) -> MeasurementSummary {
        let end = self.finished_at.unwrap_or_else(Instant::now);
        let duration_sec = end.duration_since(self.started_at).as_secs_f64();
        MeasurementSummary::from_parts(self.requested_mb, self.bytes, duration_sec, timestamp)
    }
}

/// 瞬时速率采样器
///
/// 保存上一个采样点，两点差分得出该区间的 Mbit/s
#[derive(Debug)]
pub struct RateSampler {
    last_bytes: u64,
    last_at: Instant,
}

impl RateSampler {
    pub fn new(now: Instant) -> Self {
        Self {
            last_bytes: 0,
            last_at: now,
        }
    }

    /// 记录一次采样并返回该区间的速率（Mbit/s）
    ///
    /// 区间长度为零时返回 0，不做除法
    pub fn sample(&mut self, bytes_now: u64, now: Instant) -> f64 {
        let delta_bytes = bytes_now.saturating_sub(self.last_bytes);
        let delta_sec = now.saturating_duration_since(self.last_at).as_secs_f64();
        let mbps = if delta_sec > 0.0 {
            delta_bytes as f64 * 8.0 / BYTES_PER_MB / delta_sec
        } else {
            0.0
        };
        self.last_bytes = bytes_now;
        self.last_at = now;
        mbps
    }
}
