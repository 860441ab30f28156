use flate2::{Compression, GzBuilder};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;
use tokio::sync::Semaphore;

/// 同时运行的压缩任务上限，轮转风暴时不至于无限生成任务
pub const MAX_CONCURRENT: usize = 2;

/// 压缩一个已轮转的文件。失败只打印不传播，
/// 未压缩的原文件保留作为兜底
pub async fn compress_task(sem: Arc<Semaphore>, src: PathBuf) {
    // Semaphore 不会被关闭，acquire 只在关闭时出错
    let Ok(_permit) = sem.acquire_owned().await else {
        return;
    };
    let path = src.clone();
    let res = tokio::task::spawn_blocking(move || compress_file(&path)).await;
    match res {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            eprintln!("compress {} failed: {}", src.display(), e);
        }
        Err(e) => {
            eprintln!("compress task panicked for {}: {}", src.display(), e);
        }
    }
}

/// gzip 压缩 src 为 src.gz，头部保留原文件名和修改时间，
/// 成功后删除原文件
fn compress_file(src: &Path) -> io::Result<()> {
    let infile = std::fs::File::open(src)?;
    let meta = infile.metadata()?;
    let mtime = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0);
    let name = src
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let dst = PathBuf::from(format!("{}.gz", src.display()));
    let outfile = std::fs::File::create(&dst)?;
    let mut encoder = GzBuilder::new()
        .filename(name)
        .mtime(mtime)
        .write(io::BufWriter::new(outfile), Compression::default());

    let mut reader = io::BufReader::new(infile);
    io::copy(&mut reader, &mut encoder)?;
    let mut out = encoder.finish()?;
    io::Write::flush(&mut out)?;

    std::fs::remove_file(src)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    #[test]
    fn compress_file_roundtrip_and_removes_source() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("app.log.202608281");
        std::fs::write(&src, b"helloworld!").unwrap();

        compress_file(&src).unwrap();

        assert!(!src.exists());
        let gz_path = dir.path().join("app.log.202608281.gz");
        let mut decoder = GzDecoder::new(std::fs::File::open(&gz_path).unwrap());
        let mut out = Vec::new();
        decoder.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"helloworld!");
    }

    #[test]
    fn gzip_header_keeps_original_name() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("app.log.202608282");
        std::fs::write(&src, b"some data").unwrap();

        compress_file(&src).unwrap();

        let gz_path = dir.path().join("app.log.202608282.gz");
        let mut decoder = GzDecoder::new(std::fs::File::open(&gz_path).unwrap());
        let mut out = Vec::new();
        decoder.read_to_end(&mut out).unwrap();
        let header = decoder.header().unwrap();
        assert_eq!(header.filename(), Some(b"app.log.202608282".as_ref()));
        assert!(header.mtime() > 0);
    }

    #[test]
    fn compress_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("no-such-file");
        assert!(compress_file(&src).is_err());
        assert!(!dir.path().join("no-such-file.gz").exists());
    }

    #[tokio::test]
    async fn compress_task_swallows_errors() {
        let sem = Arc::new(Semaphore::new(MAX_CONCURRENT));
        let dir = tempfile::tempdir().unwrap();
        // 不存在的文件不应让任务 panic
        compress_task(sem, dir.path().join("gone")).await;
    }
}
