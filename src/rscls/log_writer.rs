use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::rotate_worker::RotateWorker;
use crate::rsobj::rotate_policy::{RotatePolicy, size_bytes};

/// 队列容量，写满后生产者等待，这是唯一的背压点
const QUEUE_CAP: usize = 1000;

/// 写入器配置。既可链式调用设置，也可从 toml 文件读取，
/// 文件缺失或解析失败时回落到默认值
#[derive(serde::Deserialize, Debug, Clone)]
#[serde(default)]
pub struct LogFileConfig {
    pub file_name: String,
    pub file_path: String,
    /// 大小阈值数值，0 表示不按大小轮转
    pub size_value: u64,
    /// K/M/G，其他值按原始字节数
    pub size_unit: String,
    pub time_rotate: bool,
    pub compress: bool,
}

impl Default for LogFileConfig {
    fn default() -> Self {
        Self {
            file_name: String::new(),
            file_path: ".".to_string(),
            size_value: 0,
            size_unit: String::new(),
            time_rotate: false,
            compress: false,
        }
    }
}

impl LogFileConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &str) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// 基础文件名
    pub fn file_name(mut self, name: &str) -> Self {
        self.file_name = name.to_string();
        self
    }

    /// 目标目录，不存在时递归创建
    pub fn file_path(mut self, dir: &str) -> Self {
        self.file_path = dir.to_string();
        self
    }

    /// 启用按大小轮转
    pub fn file_size(mut self, value: u64, unit: &str) -> Self {
        self.size_value = value;
        self.size_unit = unit.to_string();
        self
    }

    /// 启用按天轮转
    pub fn file_time(mut self, enabled: bool) -> Self {
        self.time_rotate = enabled;
        self
    }

    /// 启用轮转后 gzip 压缩
    pub fn file_compress(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    pub(crate) fn policy(&self) -> RotatePolicy {
        RotatePolicy {
            size_limit: (self.size_value > 0)
                .then(|| size_bytes(self.size_value, &self.size_unit)),
            daily: self.time_rotate,
        }
    }
}

/// 异步轮转日志写入器的入口。写入只是入队，
/// 磁盘 IO 和轮转全部在后台 worker 任务里
pub struct LogWriter {
    tx: mpsc::Sender<Vec<u8>>,
    worker: JoinHandle<()>,
}

impl LogWriter {
    /// 构造永不失败：目录或文件打不开时打印到 stderr，
    /// 返回的写入器退化为丢记录或标准输出
    pub async fn new(cfg: LogFileConfig) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_CAP);
        let worker = RotateWorker::new(
            cfg.file_name.clone(),
            PathBuf::from(&cfg.file_path),
            cfg.policy(),
            cfg.compress,
        )
        .await;
        let handle = tokio::spawn(worker.run(rx));
        LogWriter { tx, worker: handle }
    }

    /// 拷贝一份入队后立即返回完整字节数。
    /// 只在队列满时等待，下游写盘、轮转、压缩的错误不上抛
    pub async fn write(&self, buf: &[u8]) -> usize {
        let _ = self.tx.send(buf.to_vec()).await;
        buf.len()
    }

    /// 给同步日志门面用的 io::Write 端点
    pub fn sink(&self) -> LogSink {
        LogSink {
            tx: self.tx.clone(),
        }
    }

    /// 排干队列、关闭文件、等所有压缩任务结束。
    /// 克隆出去的 LogSink 也都释放后 worker 才会退出
    pub async fn close(self) {
        drop(self.tx);
        let _ = self.worker.await;
    }
}

/// 同步写入端，可克隆给多个生产者线程。
/// 队列满时阻塞当前线程，不要在异步任务里调用
#[derive(Clone)]
pub struct LogSink {
    tx: mpsc::Sender<Vec<u8>>,
}

impl std::io::Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let _ = self.tx.blocking_send(buf.to_vec());
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
