//! File tail — follows a growing log file like `tail -F`.
//!
//! - Reads from the start (or the end, if asked) and then polls for growth
//! - Truncation in place rewinds to offset 0
//! - Rotation (the path now names a different file) drains the old handle
//!   and reopens the path
//! - Unterminated trailing text is held back until its newline arrives

use std::future::Future;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};
use tracing::{debug, info, trace, warn};

use super::error::SourceError;
use super::file_id::{self, FileId};
use super::traits::LineSource;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailOptions {
    /// Fail at open time if the file is missing, instead of waiting for it
    pub must_exist: bool,
    /// Keep waiting for appended lines after reaching end of file
    pub follow: bool,
    /// Reopen the path after rotation or removal
    pub reopen: bool,
    /// Skip content already in the file when first opened
    pub start_at_end: bool,
    pub poll_interval: Duration,
}

impl Default for TailOptions {
    fn default() -> Self {
        Self {
            must_exist: true,
            follow: true,
            reopen: true,
            start_at_end: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// What happened to the path since the current handle was opened.
enum Change {
    Unchanged,
    Truncated,
    Replaced,
    Missing,
}

pub struct FileTail {
    path: PathBuf,
    options: TailOptions,
    reader: Option<BufReader<File>>,
    identity: Option<FileId>,
    /// Bytes consumed from the current handle
    position: u64,
    /// Unterminated line read so far
    partial: Vec<u8>,
    stopped: bool,
}

impl FileTail {
    /// Open `path` for tailing.
    ///
    /// A missing file is an error only when `must_exist` is set; otherwise
    /// the tail waits for the file to appear.
    pub async fn open(path: impl AsRef<Path>, options: TailOptions) -> Result<Self, SourceError> {
        let mut tail = Self {
            path: path.as_ref().to_path_buf(),
            options,
            reader: None,
            identity: None,
            position: 0,
            partial: Vec::new(),
            stopped: false,
        };

        match tail.attach(options.start_at_end).await {
            Ok(()) => info!(path = %tail.path.display(), position = tail.position, "tailing log file"),
            Err(SourceError::NotFound(_)) if !options.must_exist => {
                info!(path = %tail.path.display(), "log file does not exist yet, waiting for it");
            }
            Err(e) => return Err(e),
        }

        Ok(tail)
    }

    /// Byte offset within the currently open file
    pub fn position(&self) -> u64 {
        self.position
    }

    async fn attach(&mut self, seek_end: bool) -> Result<(), SourceError> {
        let file = File::open(&self.path)
            .await
            .map_err(|e| SourceError::from_open(&self.path, e))?;
        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(SourceError::NotAFile(self.path.clone()));
        }

        let mut reader = BufReader::new(file);
        let position = if seek_end {
            reader.seek(SeekFrom::End(0)).await?
        } else {
            0
        };

        self.identity = FileId::from_metadata(&metadata);
        self.position = position;
        self.reader = Some(reader);
        Ok(())
    }

    async fn inspect(&self) -> Change {
        match tokio::fs::metadata(&self.path).await {
            Err(_) => Change::Missing,
            Ok(m) if file_id::replaced(self.identity, FileId::from_metadata(&m)) => Change::Replaced,
            Ok(m) if m.len() < self.position => Change::Truncated,
            Ok(_) => Change::Unchanged,
        }
    }

    fn take_partial(&mut self) -> Option<String> {
        if self.partial.is_empty() {
            return None;
        }
        let line = decode(&self.partial);
        self.partial.clear();
        Some(line)
    }

    fn release(&mut self) {
        self.reader = None;
        self.identity = None;
        self.position = 0;
    }

    async fn read_next(&mut self) -> Option<String> {
        loop {
            if self.stopped {
                return None;
            }

            let Some(reader) = self.reader.as_mut() else {
                if !self.options.follow {
                    return None;
                }
                tokio::time::sleep(self.options.poll_interval).await;
                match self.attach(false).await {
                    Ok(()) => info!(path = %self.path.display(), "log file opened"),
                    Err(e) => trace!(error = %e, "log file not available yet"),
                }
                continue;
            };

            match reader.read_until(b'\n', &mut self.partial).await {
                Ok(0) => {}
                Ok(n) => {
                    self.position += n as u64;
                    if self.partial.last() == Some(&b'\n') {
                        return self.take_partial();
                    }
                    continue;
                }
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "read failed, dropping handle");
                    let flushed = self.take_partial();
                    self.release();
                    if !self.options.reopen {
                        self.stopped = true;
                    }
                    if flushed.is_some() {
                        return flushed;
                    }
                    continue;
                }
            }

            // End of file on the current handle
            if !self.options.follow {
                let flushed = self.take_partial();
                self.release();
                return flushed;
            }

            match self.inspect().await {
                Change::Unchanged => tokio::time::sleep(self.options.poll_interval).await,
                Change::Truncated => {
                    warn!(path = %self.path.display(), position = self.position, "log file truncated, reading from the start");
                    let flushed = self.take_partial();
                    self.rewind().await;
                    if flushed.is_some() {
                        return flushed;
                    }
                }
                Change::Replaced | Change::Missing => {
                    // Drain whatever reached the old file before switching
                    if self.read_old().await {
                        if self.partial.last() == Some(&b'\n') {
                            return self.take_partial();
                        }
                        continue;
                    }
                    let flushed = self.take_partial();
                    self.release();
                    if self.options.reopen {
                        info!(path = %self.path.display(), "log file rotated, reopening");
                        if let Err(e) = self.attach(false).await {
                            debug!(error = %e, "rotated log file not available yet");
                        }
                    } else {
                        info!(path = %self.path.display(), "log file rotated, ending tail");
                        self.stopped = true;
                    }
                    if flushed.is_some() {
                        return flushed;
                    }
                }
            }
        }
    }

    /// One more read on the current handle; true if it produced bytes.
    async fn read_old(&mut self) -> bool {
        let Some(reader) = self.reader.as_mut() else {
            return false;
        };
        match reader.read_until(b'\n', &mut self.partial).await {
            Ok(n) if n > 0 => {
                self.position += n as u64;
                true
            }
            Ok(_) => false,
            Err(e) => {
                debug!(error = %e, "final read on rotated file failed");
                false
            }
        }
    }

    async fn rewind(&mut self) {
        let Some(reader) = self.reader.as_mut() else {
            return;
        };
        match reader.seek(SeekFrom::Start(0)).await {
            Ok(_) => self.position = 0,
            Err(e) => {
                warn!(error = %e, "rewind failed, reopening");
                self.release();
            }
        }
    }
}

impl LineSource for FileTail {
    fn next_line(&mut self) -> Pin<Box<dyn Future<Output = Option<String>> + Send + '_>> {
        Box::pin(self.read_next())
    }

    fn stop(&mut self) {
        if !self.stopped {
            debug!(path = %self.path.display(), "tail stopped, releasing file handle");
        }
        self.stopped = true;
        self.partial.clear();
        self.release();
    }
}

/// Lossy UTF-8 decode without the line terminator.
fn decode(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(|c| c == '\n' || c == '\r')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tokio::time::timeout;

    fn fast() -> TailOptions {
        TailOptions {
            poll_interval: Duration::from_millis(10),
            ..Default::default()
        }
    }

    async fn next(tail: &mut FileTail) -> Option<String> {
        timeout(Duration::from_secs(5), tail.next_line())
            .await
            .expect("timed out waiting for a line")
    }

    fn append(path: &Path, text: &str) {
        let mut file = std::fs::OpenOptions::new().append(true).create(true).open(path).unwrap();
        file.write_all(text.as_bytes()).unwrap();
    }

    #[test]
    fn test_decode_trims_terminators() {
        assert_eq!(decode(b"abc\r\n"), "abc");
        assert_eq!(decode(b"abc\n"), "abc");
        assert_eq!(decode(b"abc"), "abc");
        assert_eq!(decode(b"\xFFok\n"), "\u{FFFD}ok");
    }

    #[tokio::test]
    async fn test_missing_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let result = FileTail::open(dir.path().join("absent.log"), fast()).await;
        assert!(matches!(result, Err(SourceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_directory_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = FileTail::open(dir.path(), fast()).await;
        assert!(matches!(result, Err(SourceError::NotAFile(_))));
    }

    #[tokio::test]
    async fn test_reads_existing_without_follow() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug.log");
        std::fs::write(&path, "first\r\nsecond\npartial").unwrap();

        let mut tail = FileTail::open(&path, TailOptions { follow: false, ..fast() }).await.unwrap();
        assert_eq!(next(&mut tail).await.as_deref(), Some("first"));
        assert_eq!(next(&mut tail).await.as_deref(), Some("second"));
        assert_eq!(next(&mut tail).await.as_deref(), Some("partial"));
        assert_eq!(next(&mut tail).await, None);
    }

    #[tokio::test]
    async fn test_follows_appended_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug.log");
        std::fs::write(&path, "one\n").unwrap();

        let mut tail = FileTail::open(&path, fast()).await.unwrap();
        assert_eq!(next(&mut tail).await.as_deref(), Some("one"));

        append(&path, "two\n");
        assert_eq!(next(&mut tail).await.as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn test_partial_line_held_until_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug.log");
        std::fs::write(&path, "09:16:02 (adskflex) OUT: ").unwrap();

        let mut tail = FileTail::open(&path, fast()).await.unwrap();
        let writer = {
            let path = path.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                append(&path, "\"maya2024\" alice@ws1\n");
            })
        };

        assert_eq!(
            next(&mut tail).await.as_deref(),
            Some("09:16:02 (adskflex) OUT: \"maya2024\" alice@ws1")
        );
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn test_start_at_end_skips_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug.log");
        std::fs::write(&path, "old line\n").unwrap();

        let mut tail = FileTail::open(&path, TailOptions { start_at_end: true, ..fast() }).await.unwrap();
        assert_eq!(tail.position(), 9);

        append(&path, "new line\n");
        assert_eq!(next(&mut tail).await.as_deref(), Some("new line"));
    }

    #[tokio::test]
    async fn test_truncation_rewinds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug.log");
        std::fs::write(&path, "a fairly long first line\nanother long second line\n").unwrap();

        let mut tail = FileTail::open(&path, fast()).await.unwrap();
        assert_eq!(next(&mut tail).await.as_deref(), Some("a fairly long first line"));
        assert_eq!(next(&mut tail).await.as_deref(), Some("another long second line"));

        std::fs::write(&path, "short\n").unwrap();
        assert_eq!(next(&mut tail).await.as_deref(), Some("short"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_rotation_reopens_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug.log");
        std::fs::write(&path, "before rotation\n").unwrap();

        let mut tail = FileTail::open(&path, fast()).await.unwrap();
        assert_eq!(next(&mut tail).await.as_deref(), Some("before rotation"));

        std::fs::rename(&path, dir.path().join("debug.log.1")).unwrap();
        std::fs::write(&path, "after rotation\n").unwrap();

        assert_eq!(next(&mut tail).await.as_deref(), Some("after rotation"));
    }

    #[tokio::test]
    async fn test_read_old_picks_up_late_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug.log");
        std::fs::write(&path, "first\n").unwrap();

        let mut tail = FileTail::open(&path, fast()).await.unwrap();
        assert_eq!(next(&mut tail).await.as_deref(), Some("first"));
        assert!(!tail.read_old().await);

        append(&path, "late\n");
        assert!(tail.read_old().await);
        assert_eq!(tail.take_partial().as_deref(), Some("late"));
        assert_eq!(tail.position(), 11);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_rotation_drains_old_file_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug.log");
        std::fs::write(&path, "before rotation\n").unwrap();

        let mut tail = FileTail::open(&path, fast()).await.unwrap();
        assert_eq!(next(&mut tail).await.as_deref(), Some("before rotation"));

        append(&path, "written late\n");
        std::fs::rename(&path, dir.path().join("debug.log.1")).unwrap();
        std::fs::write(&path, "after rotation\n").unwrap();

        assert_eq!(next(&mut tail).await.as_deref(), Some("written late"));
        assert_eq!(next(&mut tail).await.as_deref(), Some("after rotation"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_rotation_without_reopen_ends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug.log");
        std::fs::write(&path, "only\n").unwrap();

        let mut tail = FileTail::open(&path, TailOptions { reopen: false, ..fast() }).await.unwrap();
        assert_eq!(next(&mut tail).await.as_deref(), Some("only"));

        std::fs::rename(&path, dir.path().join("debug.log.1")).unwrap();
        std::fs::write(&path, "ignored\n").unwrap();

        assert_eq!(next(&mut tail).await, None);
    }

    #[tokio::test]
    async fn test_waits_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("later.log");

        let mut tail = FileTail::open(&path, TailOptions { must_exist: false, ..fast() }).await.unwrap();
        let writer = {
            let path = path.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                std::fs::write(&path, "hello\n").unwrap();
            })
        };

        assert_eq!(next(&mut tail).await.as_deref(), Some("hello"));
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_releases_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug.log");
        std::fs::write(&path, "line\n").unwrap();

        let mut tail = FileTail::open(&path, fast()).await.unwrap();
        tail.stop();
        assert!(tail.reader.is_none());
        assert_eq!(next(&mut tail).await, None);
    }
}
