//! Error types for shadow repository operations.

use thiserror::Error;

/// Errors that can occur during shadow repository operations.
#[derive(Debug, Error)]
pub enum ShadowGitError {
    /// Failed to open the repository.
    #[error("Failed to open repository: {0}")]
    RepositoryOpen(String),

    /// No repository exists at or above the given path.
    #[error("Repository not found: {0}")]
    RepositoryNotFound(String),

    /// Failed to get repository HEAD.
    #[error("Failed to get HEAD: {0}")]
    HeadAccess(String),

    /// Branch not found.
    #[error("Branch not found: {0}")]
    BranchNotFound(String),

    /// Branch already exists.
    #[error("Branch already exists: {0}")]
    BranchExists(String),

    /// Failed to create branch.
    #[error("Failed to create branch: {0}")]
    BranchCreate(String),

    /// Failed to rename branch.
    #[error("Failed to rename branch: {0}")]
    BranchRename(String),

    /// Failed to delete branch.
    #[error("Failed to delete branch: {0}")]
    BranchDelete(String),

    /// Failed to list branches.
    #[error("Failed to list branches: {0}")]
    BranchList(String),

    /// Failed to check out a branch.
    #[error("Failed to checkout branch: {0}")]
    Checkout(String),

    /// Failed to access the git index.
    #[error("Failed to access index: {0}")]
    IndexAccess(String),

    /// Failed to write to the git index.
    #[error("Failed to write index: {0}")]
    IndexWrite(String),

    /// Failed to create a commit.
    #[error("Failed to create commit: {0}")]
    CommitCreation(String),

    /// Staged tree is identical to the branch tip.
    #[error("Nothing to commit")]
    NothingToCommit,

    /// Remote not found.
    #[error("Remote not found: {0}")]
    RemoteNotFound(String),

    /// Remote configuration failed.
    #[error("Remote operation failed: {0}")]
    Remote(String),

    /// Push failed.
    #[error("Push failed: {0}")]
    PushFailed(String),

    /// Remote rejected credentials.
    #[error("Authentication required for remote: {0}")]
    AuthRequired(String),

    /// Invalid path.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Filesystem operation failed.
    #[error("Filesystem error: {0}")]
    Filesystem(String),
}

impl ShadowGitError {
    /// True for missing branches, remotes, and repositories.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::BranchNotFound(_) | Self::RemoteNotFound(_) | Self::RepositoryNotFound(_)
        )
    }

    /// True when the target name is already taken.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::BranchExists(_))
    }
}

impl From<ShadowGitError> for String {
    fn from(err: ShadowGitError) -> Self {
        err.to_string()
    }
}
