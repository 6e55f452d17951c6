use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use waster_rs::meter::{self, ConsoleDisplay, MeterOptions, MeterOutcome};
use waster_rs::model::config::Config;
use waster_rs::server;

#[derive(Parser)]
#[command(name = "waster-rs", version, about = "HTTP 带宽测量工具")]
struct Cli {
    /// 配置文件路径
    #[arg(short, long, default_value = Config::default_config_path())]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// 启动测量服务器（默认）
    Serve,
    /// 对服务器执行一次吞吐量测量
    Measure {
        /// 服务器基地址
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        server: String,
        /// 请求的数据量（MB），0 表示不限量（Ctrl-C 停止）
        #[arg(long, default_value_t = 0.0)]
        mb: f64,
        /// 速率采样间隔（毫秒）
        #[arg(long, default_value_t = meter::DEFAULT_SAMPLE_INTERVAL_MS)]
        interval_ms: u64,
        /// 测量结束后把结果保存到服务器日志
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        None | Some(Command::Serve) => {
            let mut config = Config::load(&cli.config)?;
            config.apply_port_env(std::env::var("PORT").ok());
            server::run(&config).await
        }
        Some(Command::Measure {
            server,
            mb,
            interval_ms,
            save,
        }) => measure(server, mb, interval_ms, save).await,
    }
}

/// measure 子命令：执行测量、打印汇总，按需提交日志
async fn measure(server: String, mb: f64, interval_ms: u64, save: bool) -> Result<()> {
    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()?;
    let options = MeterOptions {
        server: server.clone(),
        mb,
        sample_interval: Duration::from_millis(interval_ms),
    };

    // Ctrl-C 触发停止信号
    let (stop_tx, stop_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = stop_tx.send(true);
        }
    });

    let mut display = ConsoleDisplay::default();
    let (summary, outcome) = meter::run_meter(&client, &options, stop_rx, &mut display).await?;

    println!();
    match outcome {
        MeterOutcome::Completed => println!("测量完成"),
        MeterOutcome::Cancelled => println!("测量已停止"),
    }
    println!(
        "接收 {:.3} MB，历时 {:.3} 秒，平均 {:.3} Mbit/s",
        summary.wasted_mb, summary.duration_sec, summary.avg_mbps
    );

    if save {
        meter::save_summary(&client, &server, &summary).await?;
        println!(
            "测量结果已保存，可通过 {}/logs 查看",
            server.trim_end_matches('/')
        );
    }
    Ok(())
}
