//! The mutable size ignore list.
//!
//! Plain UTF-8 text, one relative path per line. Writes keep whatever
//! the file does with its last line: a file that ends without a newline
//! still does after an append or a remove. The whole file is rescanned on
//! every call; the event rate is low enough that caching is not worth the
//! invalidation.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::IgnoreListError;

/// Line-oriented ignore list file.
#[derive(Debug, Clone)]
pub struct IgnoreList {
    path: PathBuf,
}

fn line_matches(line: &str, entry: &str) -> bool {
    line.trim_end_matches(['\n', '\r']) == entry
}

impl IgnoreList {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<String, IgnoreListError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(source) => Err(IgnoreListError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// All entries in file order.
    pub fn entries(&self) -> Result<Vec<String>, IgnoreListError> {
        Ok(self
            .read()?
            .lines()
            .map(|line| line.trim_end_matches('\r').to_string())
            .filter(|line| !line.is_empty())
            .collect())
    }

    /// Whether `entry` appears as a whole line.
    pub fn contains(&self, entry: &str) -> Result<bool, IgnoreListError> {
        Ok(self.read()?.lines().any(|line| line_matches(line, entry)))
    }

    /// Append `entry` unless it is already listed. Returns whether it was added.
    pub fn append_if_absent(&self, entry: &str) -> Result<bool, IgnoreListError> {
        let content = self.read()?;
        if content.lines().any(|line| line_matches(line, entry)) {
            return Ok(false);
        }

        let write_err = |source| IgnoreListError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(write_err)?;

        let line = if content.is_empty() || content.ends_with('\n') {
            format!("{}\n", entry)
        } else {
            format!("\n{}", entry)
        };
        file.write_all(line.as_bytes()).map_err(write_err)?;

        debug!(entry = %entry, file = %self.path.display(), "added to ignore list");
        Ok(true)
    }

    /// Drop every line equal to `entry`. Returns whether anything was removed.
    ///
    /// Other lines keep their exact bytes, so an append followed by a remove
    /// leaves the file as it was.
    pub fn remove_line(&self, entry: &str) -> Result<bool, IgnoreListError> {
        let content = self.read()?;
        let mut kept: String = content
            .split_inclusive('\n')
            .filter(|line| !line_matches(line, entry))
            .collect();

        if kept.len() == content.len() {
            return Ok(false);
        }

        // Dropped an unterminated last line: the new last line takes its place.
        if !content.is_empty() && !content.ends_with('\n') && kept.ends_with('\n') {
            kept.pop();
            if kept.ends_with('\r') {
                kept.pop();
            }
        }

        fs::write(&self.path, kept).map_err(|source| IgnoreListError::Write {
            path: self.path.clone(),
            source,
        })?;

        debug!(entry = %entry, file = %self.path.display(), "removed from ignore list");
        Ok(true)
    }
}
