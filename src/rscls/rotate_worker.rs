use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;

use super::compressor;
use crate::rsobj::rotate_policy::RotatePolicy;
use crate::rsobj::writer_state::WriterState;

/// 队列里唯一的消费者，独占文件句柄。
/// 写入、策略判断、轮转都只在这个任务里发生，状态无需加锁
pub(crate) struct RotateWorker {
    /// None 表示退化为标准输出，或轮转后重开失败
    cur_file: Option<BufWriter<File>>,
    file_name: String,
    file_path: PathBuf,
    policy: RotatePolicy,
    compress: bool,
    /// 上次轮转日期，YYYY-MM-DD
    today_date: String,
    /// 进程生命周期内单调递增，同一天多次轮转靠它区分
    cnt: u32,
    state: WriterState,
    compress_tasks: JoinSet<()>,
    compress_sem: Arc<Semaphore>,
}

async fn open_append(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path).await
}

impl RotateWorker {
    /// 创建目录并打开初始文件。失败只打印，不阻止构造
    pub(crate) async fn new(
        file_name: String,
        file_path: PathBuf,
        policy: RotatePolicy,
        compress: bool,
    ) -> Self {
        if let Err(e) = tokio::fs::create_dir_all(&file_path).await {
            eprintln!("create log file path {} failed: {}", file_path.display(), e);
        }

        let mut worker = RotateWorker {
            cur_file: None,
            file_name,
            file_path,
            policy,
            compress,
            today_date: Local::now().format("%Y-%m-%d").to_string(),
            cnt: 0,
            state: WriterState::Running,
            compress_tasks: JoinSet::new(),
            compress_sem: Arc::new(Semaphore::new(compressor::MAX_CONCURRENT)),
        };

        if !worker.file_name.is_empty() {
            let path = worker.active_path();
            match open_append(&path).await {
                Ok(file) => worker.cur_file = Some(BufWriter::new(file)),
                Err(e) => eprintln!("open log file {} failed: {}", path.display(), e),
            }
        }

        worker
    }

    fn active_path(&self) -> PathBuf {
        self.file_path.join(&self.file_name)
    }

    /// 消费循环：发送端全部关闭即为关闭信号，
    /// 剩余消息先排干再收尾
    pub(crate) async fn run(mut self, mut rx: mpsc::Receiver<Vec<u8>>) {
        while let Some(msg) = rx.recv().await {
            self.handle_record(&msg).await;
        }
        self.shutdown().await;
    }

    /// 写一条记录，然后评估轮转策略。
    /// 写失败只打印，该条记录丢弃
    pub(crate) async fn handle_record(&mut self, msg: &[u8]) {
        if self.state == WriterState::Closed {
            return;
        }
        if self.file_name.is_empty() {
            let mut stdout = tokio::io::stdout();
            if let Err(e) = stdout.write_all(msg).await {
                eprintln!("write stdout failed: {}", e);
                return;
            }
            if let Err(e) = stdout.flush().await {
                eprintln!("flush stdout failed: {}", e);
            }
            return;
        }

        // 上次轮转重开失败的话，写下一条前再试一次
        if self.cur_file.is_none() {
            let path = self.active_path();
            match open_append(&path).await {
                Ok(file) => self.cur_file = Some(BufWriter::new(file)),
                Err(e) => {
                    eprintln!("reopen log file {} failed, record dropped: {}", path.display(), e);
                    return;
                }
            }
        }

        let writer = self.cur_file.as_mut().unwrap();
        if let Err(e) = writer.write_all(msg).await {
            eprintln!("write log file failed: {}", e);
            return;
        }
        if let Err(e) = writer.flush().await {
            eprintln!("flush log file failed: {}", e);
            return;
        }

        let size = match tokio::fs::metadata(self.active_path()).await {
            Ok(meta) => meta.len(),
            Err(_) => return,
        };
        let today = Local::now().format("%Y-%m-%d").to_string();
        if self.policy.should_rotate(size, &today, &self.today_date) {
            self.do_rotate().await;
        }
    }

    /// 关、改名、重开。出错只打印，轮转尽力而为
    async fn do_rotate(&mut self) {
        let path = self.active_path();
        if tokio::fs::metadata(&path).await.is_err() {
            eprintln!("do_rotate: {} not accessible, skip", path.display());
            return;
        }

        self.state = WriterState::Rotating;
        if let Some(mut writer) = self.cur_file.take() {
            if let Err(e) = writer.flush().await {
                eprintln!("do_rotate flush failed: {}", e);
            }
            // BufWriter 析构即关闭句柄
        }

        let now = Local::now();
        self.cnt += 1;
        let rotated = PathBuf::from(format!(
            "{}.{}{}",
            path.display(),
            now.format("%Y%m%d"),
            self.cnt
        ));
        if let Err(e) = tokio::fs::rename(&path, &rotated).await {
            eprintln!("do_rotate rename failed: {}", e);
        }

        match open_append(&path).await {
            Ok(file) => self.cur_file = Some(BufWriter::new(file)),
            Err(e) => eprintln!("do_rotate reopen {} failed: {}", path.display(), e),
        }

        self.state = WriterState::Running;
        self.today_date = now.format("%Y-%m-%d").to_string();

        if self.compress {
            let sem = self.compress_sem.clone();
            self.compress_tasks
                .spawn(compressor::compress_task(sem, rotated));
            // 顺手回收已结束的压缩任务
            while self.compress_tasks.try_join_next().is_some() {}
        }
    }

    /// 排干之后的收尾：关文件，等所有压缩任务结束
    async fn shutdown(mut self) {
        if let Some(mut writer) = self.cur_file.take() {
            if let Err(e) = writer.flush().await {
                eprintln!("shutdown flush failed: {}", e);
            }
        }
        self.state = WriterState::Closed;
        while self.compress_tasks.join_next().await.is_some() {}
    }
}
