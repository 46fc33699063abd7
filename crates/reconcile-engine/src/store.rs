//! The repository capabilities the engine needs.

use shadow_git::{ShadowGitError, ShadowRepository};
use std::path::Path;

/// Branch operations against the shadow repository.
///
/// Every call blocks on local disk. Implementations report a missing
/// branch as [`ShadowGitError::BranchNotFound`], a taken name as
/// [`ShadowGitError::BranchExists`], and an unchanged tree as
/// [`ShadowGitError::NothingToCommit`].
pub trait BranchStore {
    /// Root of the working copy the shadow tree lives in.
    fn workdir(&self) -> &Path;

    fn current_branch(&self) -> Option<String>;

    fn branch_exists(&self, name: &str) -> Result<bool, ShadowGitError>;

    fn create_branch(&self, name: &str, from: &str) -> Result<(), ShadowGitError>;

    fn checkout_branch(&self, name: &str) -> Result<(), ShadowGitError>;

    /// Stage `paths` (relative to the working copy) and commit on `branch`.
    /// Returns the new commit id.
    fn commit_paths(
        &self,
        branch: &str,
        paths: &[&Path],
        message: &str,
        allow_empty: bool,
    ) -> Result<String, ShadowGitError>;

    fn rename_branch(&self, old: &str, new: &str) -> Result<(), ShadowGitError>;
}

impl BranchStore for ShadowRepository {
    fn workdir(&self) -> &Path {
        ShadowRepository::workdir(self)
    }

    fn current_branch(&self) -> Option<String> {
        ShadowRepository::current_branch(self)
    }

    fn branch_exists(&self, name: &str) -> Result<bool, ShadowGitError> {
        ShadowRepository::branch_exists(self, name)
    }

    fn create_branch(&self, name: &str, from: &str) -> Result<(), ShadowGitError> {
        ShadowRepository::create_branch(self, name, from)
    }

    fn checkout_branch(&self, name: &str) -> Result<(), ShadowGitError> {
        ShadowRepository::checkout_branch(self, name)
    }

    fn commit_paths(
        &self,
        branch: &str,
        paths: &[&Path],
        message: &str,
        allow_empty: bool,
    ) -> Result<String, ShadowGitError> {
        self.commit_paths_to_branch(branch, paths, message, allow_empty)
            .map(|result| result.oid)
    }

    fn rename_branch(&self, old: &str, new: &str) -> Result<(), ShadowGitError> {
        ShadowRepository::rename_branch(self, old, new)
    }
}
