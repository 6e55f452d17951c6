//! 吞吐量测量运行器
//!
//! 单个协作式任务消费响应体：数据块到达、采样定时器和停止信号在
//! 同一个 select 循环里轮转，会话状态不跨任务共享

use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use chrono::{SecondsFormat, Utc};
use futures::StreamExt;
use tokio::sync::watch;

use crate::model::summary::MeasurementSummary;

use super::display::MeterDisplay;
use super::session::{MeterSession, RateSampler};

/// 默认采样间隔（毫秒）
pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 500;

/// 一次测量的参数
#[derive(Debug, Clone)]
pub struct MeterOptions {
    /// 服务器基地址，如 http://127.0.0.1:3000
    pub server: String,
    /// 请求的数据量（MB），0 表示不限量
    pub mb: f64,
    /// 速率采样间隔
    pub sample_interval: Duration,
}

/// 测量结束的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeterOutcome {
    /// 服务端按目标字节数发送完毕，正常关闭
    Completed,
    /// 收到停止信号，连接被主动中止
    Cancelled,
}

/// 执行一次吞吐量测量
///
/// 返回测量结果及结束方式。停止信号不是错误；读取出错时执行与停止
/// 相同的收尾流程后返回错误，由调用方向用户报告
pub async fn run_meter(
    client: &reqwest::Client,
    options: &MeterOptions,
    mut stop: watch::Receiver<bool>,
    display: &mut dyn MeterDisplay,
) -> Result<(MeasurementSummary, MeterOutcome)> {
    let url = format!(
        "{}/stream?mb={}",
        options.server.trim_end_matches('/'),
        options.mb
    );
    let response = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("连接服务器失败: {}", url))?
        .error_for_status()
        .context("服务器返回错误状态")?;

    let mut session = MeterSession::new(options.mb);
    let mut sampler = RateSampler::new(Instant::now());
    let mut chunks = response.bytes_stream();
    let mut ticker = tokio::time::interval(options.sample_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // interval 的首次 tick 立即完成，先消费掉
    ticker.tick().await;

    let mut stop_alive = true;
    let outcome = loop {
        tokio::select! {
            changed = stop.changed(), if stop_alive => {
                match changed {
                    Ok(()) if *stop.borrow() => {
                        session.finish();
                        break MeterOutcome::Cancelled;
                    }
                    Ok(()) => {}
                    // 发送端已不存在，停止监听该分支
                    Err(_) => stop_alive = false,
                }
            }
            _ = ticker.tick() => {
                display.on_rate(sampler.sample(session.bytes(), Instant::now()));
            }
            chunk = chunks.next() => {
                match chunk {
                    Some(Ok(bytes)) => {
                        session.record_chunk(bytes.len());
                        display.on_bytes(session.megabytes());
                    }
                    Some(Err(e)) => {
                        session.finish();
                        tracing::error!("读取字节流失败: {}", e);
                        return Err(e).context("读取字节流失败");
                    }
                    None => {
                        session.finish();
                        break MeterOutcome::Completed;
                    }
                }
            }
        }
    };

    // 中止连接：不再处理任何已缓冲的数据块
    drop(chunks);

    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    Ok((session.summary(timestamp), outcome))
}

/// 把测量结果提交到服务器日志
pub async fn save_summary(
    client: &reqwest::Client,
    server: &str,
    summary: &MeasurementSummary,
) -> Result<()> {
    let url = format!("{}/log", server.trim_end_matches('/'));
    let response = client
        .post(&url)
        .json(summary)
        .send()
        .await
        .with_context(|| format!("提交测量日志失败: {}", url))?;

    if response.status() != http::StatusCode::OK {
        bail!("提交测量日志失败: HTTP {}", response.status());
    }
    let body: serde_json::Value = response.json().await.context("解析日志响应失败")?;
    if body.get("status").and_then(|s| s.as_str()) != Some("ok") {
        bail!("提交测量日志失败: {}", body);
    }
    Ok(())
}
