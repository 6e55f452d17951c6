//! 测量日志存储

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;

use crate::model::summary::MeasurementSummary;

/// 底层日志文件（同步）
///
/// 单个 JSON 数组文件。追加是整读整写：持有进程内写锁，读出全部
/// 记录、追加一条、写入临时文件后原子替换，不做原地修改。跨进程的
/// 并发写入没有同步，两个进程同时追加仍可能丢失一条记录
struct LogFile {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl LogFile {
    fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("创建日志目录失败: {}", parent.display()))?;
            }
        }
        if !path.exists() {
            fs::write(path, "[]")
                .with_context(|| format!("初始化日志文件失败: {}", path.display()))?;
        }
        Ok(Self {
            path: path.to_path_buf(),
            write_lock: Mutex::new(()),
        })
    }

    fn append(&self, entry: &MeasurementSummary) -> Result<()> {
        let _guard = self.write_lock.lock();

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("读取日志文件失败: {}", self.path.display()))?;
        let mut entries: Vec<MeasurementSummary> =
            serde_json::from_str(&content).context("日志文件内容损坏")?;
        entries.push(entry.clone());

        let json = serde_json::to_string_pretty(&entries).context("序列化日志失败")?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .with_context(|| format!("写入临时日志文件失败: {}", tmp.display()))?;
        fs::rename(&tmp, &self.path).context("替换日志文件失败")?;
        Ok(())
    }

    fn read_raw(&self) -> Result<String> {
        let _guard = self.write_lock.lock();
        fs::read_to_string(&self.path)
            .with_context(|| format!("读取日志文件失败: {}", self.path.display()))
    }
}

/// 异步测量日志（公开 API）
///
/// 文件 I/O 在阻塞线程池执行
#[derive(Clone)]
pub struct MeasurementLog {
    file: Arc<LogFile>,
}

impl MeasurementLog {
    /// 打开（必要时创建）日志文件
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            file: Arc::new(LogFile::new(path.as_ref())?),
        })
    }

    /// 追加一条测量记录
    pub async fn append(&self, entry: MeasurementSummary) -> Result<()> {
        let file = self.file.clone();
        tokio::task::spawn_blocking(move || file.append(&entry)).await?
    }

    /// 读取完整日志内容（原样返回 JSON 数组文本）
    pub async fn read_raw(&self) -> Result<String> {
        let file = self.file.clone();
        tokio::task::spawn_blocking(move || file.read_raw()).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_log_path() -> PathBuf {
        std::env::temp_dir().join(format!("waster-log-test-{}.json", uuid::Uuid::new_v4()))
    }

    fn sample_entry(requested_mb: f64) -> MeasurementSummary {
        MeasurementSummary::from_parts(
            requested_mb,
            1_048_576,
            2.0,
            "2026-01-01T00:00:00.000Z".into(),
        )
    }

    #[tokio::test]
    async fn test_new_seeds_empty_array() {
        let path = temp_log_path();
        let log = MeasurementLog::new(&path).unwrap();
        assert_eq!(log.read_raw().await.unwrap(), "[]");
        let _ = fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_new_creates_parent_directory() {
        let dir = std::env::temp_dir().join(format!("waster-log-dir-{}", uuid::Uuid::new_v4()));
        let path = dir.join("results.json");
        let log = MeasurementLog::new(&path).unwrap();
        assert!(path.exists());
        drop(log);
        let _ = fs::remove_dir_all(&dir);
    }

    /// 顺序追加的记录按提交顺序完整保留
    #[tokio::test]
    async fn test_append_preserves_order() {
        let path = temp_log_path();
        let log = MeasurementLog::new(&path).unwrap();

        log.append(sample_entry(1.0)).await.unwrap();
        log.append(sample_entry(2.0)).await.unwrap();

        let entries: Vec<MeasurementSummary> =
            serde_json::from_str(&log.read_raw().await.unwrap()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].requested_mb, 1.0);
        assert_eq!(entries[1].requested_mb, 2.0);
        let _ = fs::remove_file(&path);
    }

    /// 已有内容损坏时追加失败，文件保持原样
    #[tokio::test]
    async fn test_append_to_corrupted_file_fails() {
        let path = temp_log_path();
        let log = MeasurementLog::new(&path).unwrap();
        fs::write(&path, "not json").unwrap();

        assert!(log.append(sample_entry(1.0)).await.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "not json");
        let _ = fs::remove_file(&path);
    }

    /// 已存在的日志文件不会被初始化覆盖
    #[tokio::test]
    async fn test_existing_file_is_kept() {
        let path = temp_log_path();
        {
            let log = MeasurementLog::new(&path).unwrap();
            log.append(sample_entry(3.0)).await.unwrap();
        }

        let log = MeasurementLog::new(&path).unwrap();
        let entries: Vec<MeasurementSummary> =
            serde_json::from_str(&log.read_raw().await.unwrap()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].requested_mb, 3.0);
        let _ = fs::remove_file(&path);
    }
}
