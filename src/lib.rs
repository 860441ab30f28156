//! 异步轮转日志文件写入器。
//!
//! 生产者把字节缓冲写进有界队列，单个后台任务负责落盘，
//! 文件超过大小阈值或跨天时自动轮转，可选地在后台 gzip 压缩
//! 轮转出来的文件。写入端永远报告成功，下游错误只进 stderr。

mod rscls;
mod rsobj;

pub use rscls::log_writer::{LogFileConfig, LogSink, LogWriter};
pub use rsobj::rotate_policy::{RotatePolicy, size_bytes};

use std::path::PathBuf;
use tokio::sync::OnceCell;

static DEFAULT_WRITER: OnceCell<LogWriter> = OnceCell::const_new();

/// 进程级默认写入器，显式调用才初始化，只初始化一次：
/// 文件名取可执行文件名加 .log，目录为可执行文件旁的 log/，
/// 10M 阈值、按天轮转、不压缩
pub async fn init_default() -> &'static LogWriter {
    DEFAULT_WRITER
        .get_or_init(|| async { LogWriter::new(default_config()).await })
        .await
}

fn default_config() -> LogFileConfig {
    let exe = std::env::current_exe().unwrap_or_else(|_| PathBuf::from("app"));
    let name = format!(
        "{}.log",
        exe.file_stem().and_then(|s| s.to_str()).unwrap_or("app")
    );
    let dir = exe
        .parent()
        .map(|p| p.join("log"))
        .unwrap_or_else(|| PathBuf::from("log"));
    LogFileConfig::new()
        .file_name(&name)
        .file_path(&dir.to_string_lossy())
        .file_size(10, "M")
        .file_time(true)
        .file_compress(false)
}

/// 已初始化则返回默认写入器
pub fn default_writer() -> Option<&'static LogWriter> {
    DEFAULT_WRITER.get()
}
