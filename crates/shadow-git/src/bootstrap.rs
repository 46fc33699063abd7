//! Repository discovery, creation, and removal.

use git2::{Repository, RepositoryInitOptions, Signature};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::ShadowGitError;
use crate::repository::RepoIdentity;
use crate::Result;

/// First directory at or above `path` that contains a `.git` entry.
pub fn find_parent_repo(path: &Path) -> Option<PathBuf> {
    path.ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

/// HEAD file of the repository enclosing `path`.
///
/// Resolves linked worktrees, whose `.git` is a file, to their private
/// git directory.
pub fn discover_head_file(path: &Path) -> Result<PathBuf> {
    let repo = Repository::discover(path)
        .map_err(|_| ShadowGitError::RepositoryNotFound(path.display().to_string()))?;
    Ok(repo.path().join("HEAD"))
}

/// Create a shadow repository at `path` with HEAD on the base branch and
/// one empty commit for per-file branches to fork from.
///
/// Returns `false` without touching anything if a repository already exists.
pub fn init_repository(path: &Path, identity: &RepoIdentity) -> Result<bool> {
    if Repository::open(path).is_ok() {
        return Ok(false);
    }

    std::fs::create_dir_all(path).map_err(|e| ShadowGitError::Filesystem(e.to_string()))?;

    let mut opts = RepositoryInitOptions::new();
    opts.initial_head(&identity.base_branch);
    let repo = Repository::init_opts(path, &opts)
        .map_err(|e| ShadowGitError::RepositoryOpen(e.message().to_string()))?;

    let tree_oid = repo
        .index()
        .and_then(|mut index| index.write_tree())
        .map_err(|e| ShadowGitError::IndexWrite(e.message().to_string()))?;
    let tree = repo
        .find_tree(tree_oid)
        .map_err(|e| ShadowGitError::CommitCreation(e.message().to_string()))?;
    let signature = Signature::now(&identity.author_name, &identity.author_email)
        .map_err(|e| ShadowGitError::CommitCreation(e.message().to_string()))?;

    repo.commit(
        Some("HEAD"),
        &signature,
        &signature,
        "Initial commit",
        &tree,
        &[],
    )
    .map_err(|e| ShadowGitError::CommitCreation(e.message().to_string()))?;

    info!(path = %path.display(), base = %identity.base_branch, "initialized shadow repository");
    Ok(true)
}

/// Recursively delete a directory. A missing directory is not an error.
pub fn remove_directory(path: &Path) -> Result<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ShadowGitError::Filesystem(format!(
            "{}: {}",
            path.display(),
            e
        ))),
    }
}
