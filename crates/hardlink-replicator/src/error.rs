use std::path::PathBuf;
use thiserror::Error;

/// Errors from link creation and tree walking.
#[derive(Debug, Error)]
pub enum ReplicateError {
    /// Only regular files are linked.
    #[error("Refusing to link directory: {0}")]
    IsDirectory(PathBuf),

    #[error("Failed to link {src} to {dest}: {source}")]
    Link {
        src: PathBuf,
        dest: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to set permissions on {path}: {source}")]
    Permissions {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Invalid path: {0}")]
    InvalidPath(PathBuf),
}

impl ReplicateError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }

    /// True when the underlying cause is a missing file.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Link { source, .. } | Self::Permissions { source, .. } | Self::Io { source, .. } => {
                source.kind() == std::io::ErrorKind::NotFound
            }
            Self::Walk(e) => e
                .io_error()
                .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound),
            Self::IsDirectory(_) | Self::InvalidPath(_) => false,
        }
    }
}
