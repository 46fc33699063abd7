use std::path::PathBuf;
use thiserror::Error;

use fs_event_source::SourceError;
use hardlink_replicator::ReplicateError;
use ignore_list::IgnoreListError;
use shadow_git::ShadowGitError;

/// Why a single event could not be applied.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Path is outside the watch root: {0}")]
    OutsideRoot(PathBuf),

    /// Remove for a path that never had a branch.
    #[error("No branch {branch} to record removal of {path}")]
    NoBranchForRemove { path: String, branch: String },

    #[error("Failed to read HEAD file {path}: {source}")]
    HeadRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to stat {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Repository error: {0}")]
    Git(#[from] ShadowGitError),

    #[error("Replication error: {0}")]
    Replicate(#[from] ReplicateError),

    #[error("Ignore list error: {0}")]
    IgnoreList(#[from] IgnoreListError),

    #[error("Watch error: {0}")]
    Watch(#[from] SourceError),
}

impl EngineError {
    /// True when the failure is something missing rather than broken.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NoBranchForRemove { .. } => true,
            Self::HeadRead { source, .. } | Self::Io { source, .. } => {
                source.kind() == std::io::ErrorKind::NotFound
            }
            Self::Git(e) => e.is_not_found(),
            Self::Replicate(e) => e.is_not_found(),
            Self::Watch(e) => e.is_not_found(),
            Self::OutsideRoot(_) | Self::IgnoreList(_) => false,
        }
    }
}
