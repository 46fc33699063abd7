//! Append-only JSONL sink shared by the daemon and one-shot commands.
//!
//! The fmt layer formats a whole event before writing it, and the file is
//! opened with `O_APPEND` and no userspace buffer, so each event lands as
//! one intact line even when several vctrls processes log at once.

use parking_lot::{Mutex, MutexGuard};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;

/// Handle to the central log file. Clones append to the same descriptor.
#[derive(Clone)]
pub struct SharedLogFile {
    file: Arc<Mutex<File>>,
    path: PathBuf,
}

impl std::fmt::Debug for SharedLogFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedLogFile").field("path", &self.path).finish()
    }
}

impl SharedLogFile {
    /// Open `path` for appending, creating it and its parent directories.
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            file: Arc::new(Mutex::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Exclusive access to the log file for the duration of one event.
pub struct LogLine<'a> {
    file: MutexGuard<'a, File>,
}

impl Write for LogLine<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.file.write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl<'a> MakeWriter<'a> for SharedLogFile {
    type Writer = LogLine<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        LogLine {
            file: self.file.lock(),
        }
    }
}
