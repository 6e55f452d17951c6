//! 测量结果数据模型

use serde::{Deserialize, Serialize};

/// 二进制 MB（1 MiB = 1024 × 1024 字节）
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// 一次带宽测量的汇总结果
///
/// 字段与持久化日志的 JSON 格式一一对应，数值统一保留 3 位小数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementSummary {
    /// 请求的数据量（MB），0 表示不限量
    pub requested_mb: f64,
    /// 实际接收的数据量（MB）
    pub wasted_mb: f64,
    /// 测量时长（秒）
    pub duration_sec: f64,
    /// 平均吞吐率（Mbit/s）
    pub avg_mbps: f64,
    /// 测量完成时间（RFC3339）
    pub timestamp: String,
}

impl MeasurementSummary {
    /// 由原始计数计算汇总结果
    ///
    /// `duration_sec <= 0` 时平均速率记为 0，避免除零
    pub fn from_parts(requested_mb: f64, bytes: u64, duration_sec: f64, timestamp: String) -> Self {
        let wasted_mb = bytes as f64 / BYTES_PER_MB;
        let avg_mbps = if duration_sec > 0.0 {
            (bytes as f64 * 8.0) / BYTES_PER_MB / duration_sec
        } else {
            0.0
        };
        Self {
            requested_mb,
            wasted_mb: round3(wasted_mb),
            duration_sec: round3(duration_sec),
            avg_mbps: round3(avg_mbps),
            timestamp,
        }
    }
}

/// 保留 3 位小数
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
