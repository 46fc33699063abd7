use std::path::PathBuf;
use thiserror::Error;

/// Errors from setting up or changing watches.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to create watcher: {0}")]
    Create(#[source] notify::Error),

    #[error("Failed to start event translator: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Failed to watch {path}: {source}")]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("Failed to unwatch {path}: {source}")]
    Unwatch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

impl SourceError {
    /// True when the watched path does not exist.
    pub fn is_not_found(&self) -> bool {
        let source = match self {
            Self::Create(source) => source,
            Self::Watch { source, .. } | Self::Unwatch { source, .. } => source,
            Self::Spawn(_) => return false,
        };
        match &source.kind {
            notify::ErrorKind::PathNotFound | notify::ErrorKind::WatchNotFound => true,
            notify::ErrorKind::Io(io) => io.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
