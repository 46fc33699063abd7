use std::path::PathBuf;
use thiserror::Error;

/// Errors from ignore-list file mutation and pattern loading.
#[derive(Debug, Error)]
pub enum IgnoreListError {
    #[error("Failed to read ignore list {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write ignore list {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid ignore pattern: {0}")]
    Pattern(String),
}
