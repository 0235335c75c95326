use std::collections::HashMap;
use std::io::SeekFrom;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::Mutex;
use tracing::info;

use tracker_domain::ports::LineSource;
use tracker_domain::{LogSource, SourceLog};

const SCAN_CHUNK_BYTES: usize = 8 * 1024;

/// Tails append-only log files, remembering a byte cursor per source.
pub struct FileLineSource {
    logs: Vec<SourceLog>,
    tail_lines: usize,
    cursors: Mutex<HashMap<LogSource, u64>>,
}

impl FileLineSource {
    pub fn new(logs: Vec<SourceLog>, tail_lines: usize) -> Self {
        Self {
            logs,
            tail_lines,
            cursors: Mutex::new(HashMap::new()),
        }
    }

    fn path_for(&self, source: LogSource) -> Result<&str> {
        self.logs
            .iter()
            .find(|log| log.source == source)
            .map(|log| log.path.as_str())
            .ok_or_else(|| anyhow!("no log configured for {source}"))
    }
}

#[async_trait]
impl LineSource for FileLineSource {
    async fn read_new_lines(&self, source: LogSource) -> Result<Vec<String>> {
        let path = self.path_for(source)?;
        let mut file = File::open(path)
            .await
            .with_context(|| format!("failed to open {path}"))?;
        let len = file.metadata().await?.len();

        let mut cursors = self.cursors.lock().await;
        let start = match cursors.get(&source).copied() {
            Some(cursor) if cursor <= len => cursor,
            Some(_) => {
                info!(%source, path, "log shrank, reading from the start");
                0
            }
            None => tail_offset(&mut file, len, self.tail_lines).await?,
        };

        file.seek(SeekFrom::Start(start)).await?;
        let mut buf = Vec::with_capacity((len - start) as usize);
        file.take(len - start).read_to_end(&mut buf).await?;

        let consumed = match buf.iter().rposition(|byte| *byte == b'\n') {
            Some(index) => index + 1,
            None => 0,
        };
        cursors.insert(source, start + consumed as u64);

        Ok(String::from_utf8_lossy(&buf[..consumed])
            .lines()
            .map(|line| line.trim_end_matches('\r').to_string())
            .collect())
    }

    fn sources(&self) -> Vec<LogSource> {
        self.logs.iter().map(|log| log.source).collect()
    }

    async fn ping(&self, source: LogSource) -> Result<()> {
        let path = self.path_for(source)?;
        fs::metadata(path)
            .await
            .with_context(|| format!("failed to stat {path}"))?;
        Ok(())
    }
}

/// Byte offset where the last `lines` complete lines begin.
async fn tail_offset(file: &mut File, len: u64, lines: usize) -> Result<u64> {
    let mut remaining = lines + 1;
    let mut pos = len;
    let mut buf = vec![0u8; SCAN_CHUNK_BYTES];
    while pos > 0 {
        let size = (SCAN_CHUNK_BYTES as u64).min(pos) as usize;
        pos -= size as u64;
        file.seek(SeekFrom::Start(pos)).await?;
        file.read_exact(&mut buf[..size]).await?;
        for index in (0..size).rev() {
            if buf[index] == b'\n' {
                remaining -= 1;
                if remaining == 0 {
                    return Ok(pos + index as u64 + 1);
                }
            }
        }
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn source_for(path: &std::path::Path, tail_lines: usize) -> FileLineSource {
        FileLineSource::new(
            vec![SourceLog {
                source: LogSource::GameServer,
                path: path.to_string_lossy().to_string(),
            }],
            tail_lines,
        )
    }

    fn append(path: &std::path::Path, text: &str) {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .expect("open log");
        file.write_all(text.as_bytes()).expect("append");
    }

    #[tokio::test]
    async fn first_read_is_bounded_to_tail() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("d2cs.log");
        let body: String = (0..10).map(|i| format!("line {i}\n")).collect();
        append(&path, &body);

        let tailer = source_for(&path, 3);
        let lines = tailer
            .read_new_lines(LogSource::GameServer)
            .await
            .expect("read");
        assert_eq!(lines, vec!["line 7", "line 8", "line 9"]);
    }

    #[tokio::test]
    async fn consumed_lines_are_never_redelivered() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("d2cs.log");
        append(&path, "a\nb\n");

        let tailer = source_for(&path, 100);
        assert_eq!(
            tailer.read_new_lines(LogSource::GameServer).await.expect("read"),
            vec!["a", "b"]
        );
        assert!(tailer
            .read_new_lines(LogSource::GameServer)
            .await
            .expect("read")
            .is_empty());

        append(&path, "c\npartial");
        assert_eq!(
            tailer.read_new_lines(LogSource::GameServer).await.expect("read"),
            vec!["c"]
        );
        append(&path, " line\r\n");
        assert_eq!(
            tailer.read_new_lines(LogSource::GameServer).await.expect("read"),
            vec!["partial line"]
        );
    }

    #[tokio::test]
    async fn shrinking_file_resets_cursor() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("d2cs.log");
        append(&path, "old one\nold two\n");

        let tailer = source_for(&path, 100);
        tailer.read_new_lines(LogSource::GameServer).await.expect("read");

        std::fs::write(&path, "new\n").expect("rotate");
        assert_eq!(
            tailer.read_new_lines(LogSource::GameServer).await.expect("read"),
            vec!["new"]
        );
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let tailer = source_for(&dir.path().join("absent.log"), 10);
        assert!(tailer.read_new_lines(LogSource::GameServer).await.is_err());
        assert!(tailer.ping(LogSource::GameServer).await.is_err());
        assert!(tailer.read_new_lines(LogSource::Broker).await.is_err());
    }
}
