//! Local append-only log tier.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Synchronous append of one record line to durable local storage.
///
/// Implementations must serialize concurrent appends: local records
/// are strictly ordered by call sequence.
pub trait LocalAppend: Send + Sync {
    /// Append one line (newline added by the implementation) and make
    /// it durable before returning.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the line could not be fully written.
    fn append_line(&self, line: &str) -> io::Result<()>;
}

// Lets the caller keep a handle to the appender the logger owns, for
// inspection or shared file access.
impl<A: LocalAppend + ?Sized> LocalAppend for Arc<A> {
    fn append_line(&self, line: &str) -> io::Result<()> {
        (**self).append_line(line)
    }
}

/// Append-only file writer.
///
/// Single-writer by construction: all appends funnel through one
/// mutex-guarded file handle, so line order matches call order and
/// lines never interleave.
#[derive(Debug)]
pub struct FileAppender {
    file: Mutex<File>,
}

impl FileAppender {
    /// Open (or create) the log file in append mode, creating parent
    /// directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the path cannot be opened for append.
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl LocalAppend for FileAppender {
    fn append_line(&self, line: &str) -> io::Result<()> {
        let mut file = self
            .file
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
        file.flush()
    }
}

/// In-memory appender for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryAppender {
    lines: Mutex<Vec<String>>,
    fail: bool,
}

impl MemoryAppender {
    /// Create an appender that accepts every line.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an appender whose every write fails, for exercising the
    /// fatal local-write path.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            lines: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Snapshot of the appended lines, in call order.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl LocalAppend for MemoryAppender {
    fn append_line(&self, line: &str) -> io::Result<()> {
        if self.fail {
            return Err(io::Error::other("memory appender configured to fail"));
        }
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(line.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_appender_appends_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit/access.log");

        let appender = FileAppender::open(&path).unwrap();
        appender.append_line("first").unwrap();
        appender.append_line("second").unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "first\nsecond\n");
    }

    #[test]
    fn test_file_appender_reopen_appends_not_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("access.log");

        FileAppender::open(&path)
            .unwrap()
            .append_line("old")
            .unwrap();
        FileAppender::open(&path)
            .unwrap()
            .append_line("new")
            .unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "old\nnew\n");
    }

    #[test]
    fn test_memory_appender_failure_mode() {
        let appender = MemoryAppender::failing();
        assert!(appender.append_line("x").is_err());
        assert!(appender.lines().is_empty());
    }
}
