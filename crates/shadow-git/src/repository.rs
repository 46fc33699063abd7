//! Branch and commit operations on an open shadow repository.

use git2::build::CheckoutBuilder;
use git2::{BranchType, ErrorCode, ObjectType, Repository, Signature};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ShadowGitError;
use crate::Result;

/// Base branch created by [`crate::init_repository`]. Per-file branches live
/// under `<primary branch>/`, so the base must not share a name with any
/// primary project branch.
pub const DEFAULT_BASE_BRANCH: &str = "vctrls--base";

/// Who automatic commits are attributed to and where new branches fork from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoIdentity {
    /// Neutral branch used as the fork point and as a parking spot during renames.
    pub base_branch: String,
    pub author_name: String,
    pub author_email: String,
}

impl Default for RepoIdentity {
    fn default() -> Self {
        Self {
            base_branch: DEFAULT_BASE_BRANCH.to_string(),
            author_name: "AutoCommit".to_string(),
            author_email: "autocommit@example.com".to_string(),
        }
    }
}

/// Result of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitResult {
    /// Full commit hash.
    pub oid: String,
    /// First seven characters of the hash.
    pub short_oid: String,
    /// Branch the commit was written to.
    pub branch: String,
}

/// The shadow repository that receives automatic commits.
///
/// Holds the libgit2 handle for the process lifetime. Not `Sync`: exactly
/// one worker may drive it, since checkout mutates the shared working copy.
pub struct ShadowRepository {
    repo: Repository,
    workdir: PathBuf,
    identity: RepoIdentity,
}

impl std::fmt::Debug for ShadowRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShadowRepository")
            .field("workdir", &self.workdir)
            .field("identity", &self.identity)
            .finish()
    }
}

fn is_not_found(err: &git2::Error) -> bool {
    err.code() == ErrorCode::NotFound
}

fn local_ref(name: &str) -> String {
    format!("refs/heads/{}", name)
}

impl ShadowRepository {
    /// Open an existing shadow repository.
    ///
    /// # Errors
    ///
    /// Returns [`ShadowGitError::RepositoryNotFound`] when `path` is not a
    /// repository and [`ShadowGitError::RepositoryOpen`] when it is bare.
    pub fn open(path: &Path, identity: RepoIdentity) -> Result<Self> {
        let repo = Repository::open(path).map_err(|e| {
            if is_not_found(&e) {
                ShadowGitError::RepositoryNotFound(path.display().to_string())
            } else {
                ShadowGitError::RepositoryOpen(e.message().to_string())
            }
        })?;

        let workdir = repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| ShadowGitError::RepositoryOpen("repository is bare".to_string()))?;

        Ok(Self {
            repo,
            workdir,
            identity,
        })
    }

    /// Root of the working copy.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn identity(&self) -> &RepoIdentity {
        &self.identity
    }

    /// Name of the checked-out branch, or `None` for a detached or unborn HEAD.
    pub fn current_branch(&self) -> Option<String> {
        self.repo
            .head()
            .ok()
            .filter(|head| head.is_branch())
            .and_then(|head| head.shorthand().map(String::from))
    }

    /// Check whether a local branch exists.
    pub fn branch_exists(&self, name: &str) -> Result<bool> {
        match self.repo.find_branch(name, BranchType::Local) {
            Ok(_) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            // libgit2 rejects names that can never be refs
            Err(e) if e.code() == ErrorCode::InvalidSpec => Ok(false),
            Err(e) => Err(ShadowGitError::BranchList(e.message().to_string())),
        }
    }

    fn find_branch(&self, name: &str) -> Result<git2::Branch<'_>> {
        self.repo
            .find_branch(name, BranchType::Local)
            .map_err(|e| {
                if is_not_found(&e) {
                    ShadowGitError::BranchNotFound(name.to_string())
                } else {
                    ShadowGitError::BranchList(e.message().to_string())
                }
            })
    }

    fn branch_tip_commit(&self, name: &str) -> Result<git2::Commit<'_>> {
        self.find_branch(name)?
            .get()
            .peel_to_commit()
            .map_err(|e| ShadowGitError::HeadAccess(e.message().to_string()))
    }

    /// Hash of the commit a branch points at.
    pub fn branch_tip(&self, name: &str) -> Result<String> {
        Ok(self.branch_tip_commit(name)?.id().to_string())
    }

    /// Number of commits reachable from a branch.
    pub fn commit_count(&self, name: &str) -> Result<usize> {
        let tip = self.branch_tip_commit(name)?;
        let mut revwalk = self
            .repo
            .revwalk()
            .map_err(|e| ShadowGitError::HeadAccess(e.message().to_string()))?;
        revwalk
            .push(tip.id())
            .map_err(|e| ShadowGitError::HeadAccess(e.message().to_string()))?;
        Ok(revwalk.filter_map(|oid| oid.ok()).count())
    }

    /// Create `name` pointing at the tip of `from`, or at HEAD when `from` is empty.
    ///
    /// # Errors
    ///
    /// [`ShadowGitError::BranchExists`] if `name` is taken,
    /// [`ShadowGitError::BranchNotFound`] if `from` does not exist.
    pub fn create_branch(&self, name: &str, from: &str) -> Result<()> {
        if self.branch_exists(name)? {
            return Err(ShadowGitError::BranchExists(name.to_string()));
        }

        let commit = if from.is_empty() {
            self.repo
                .head()
                .and_then(|head| head.peel_to_commit())
                .map_err(|e| ShadowGitError::HeadAccess(e.message().to_string()))?
        } else {
            self.branch_tip_commit(from)?
        };

        self.repo
            .branch(name, &commit, false)
            .map_err(|e| ShadowGitError::BranchCreate(e.message().to_string()))?;

        debug!(branch = %name, from = %from, "created branch");
        Ok(())
    }

    /// Force-checkout a branch, overwriting the working copy with its tip.
    ///
    /// Already being on `name` is a no-op: a forced re-checkout would swap
    /// live hard links in the working copy for copies of the committed blobs.
    pub fn checkout_branch(&self, name: &str) -> Result<()> {
        if self.current_branch().as_deref() == Some(name) {
            return Ok(());
        }

        let branch = self.find_branch(name)?;
        let target = branch
            .get()
            .peel(ObjectType::Commit)
            .map_err(|e| ShadowGitError::Checkout(e.message().to_string()))?;
        let tree = target
            .peel_to_tree()
            .map_err(|e| ShadowGitError::Checkout(e.message().to_string()))?;

        // libgit2 rewrites existing files in place, which would write
        // through a hard link into the source tree.
        self.unlink_tree_entries(&tree)?;

        let mut opts = CheckoutBuilder::new();
        opts.force();

        self.repo
            .checkout_tree(&target, Some(&mut opts))
            .map_err(|e| ShadowGitError::Checkout(e.message().to_string()))?;
        self.repo
            .set_head(&local_ref(name))
            .map_err(|e| ShadowGitError::Checkout(e.message().to_string()))?;

        debug!(branch = %name, "checked out branch");
        Ok(())
    }

    /// Remove every working-copy file that `tree` has a blob for.
    fn unlink_tree_entries(&self, tree: &git2::Tree<'_>) -> Result<()> {
        let mut paths = Vec::new();
        tree.walk(git2::TreeWalkMode::PreOrder, |root, entry| {
            if entry.kind() == Some(ObjectType::Blob) {
                if let Some(name) = entry.name() {
                    paths.push(self.workdir.join(root).join(name));
                }
            }
            git2::TreeWalkResult::Ok
        })
        .map_err(|e| ShadowGitError::Checkout(e.message().to_string()))?;

        for path in paths {
            match std::fs::symlink_metadata(&path) {
                Ok(meta) if !meta.is_dir() => std::fs::remove_file(&path)
                    .map_err(|e| ShadowGitError::Filesystem(format!("{}: {}", path.display(), e)))?,
                _ => {}
            }
        }
        Ok(())
    }

    /// Stage exactly `path` and commit it on top of `branch`'s tip.
    pub fn commit_to_branch(
        &self,
        branch: &str,
        path: &Path,
        message: &str,
        allow_empty: bool,
    ) -> Result<CommitResult> {
        self.commit_paths_to_branch(branch, &[path], message, allow_empty)
    }

    /// Stage the given paths and commit them on top of `branch`'s tip.
    ///
    /// Paths are relative to the working copy root. A path missing from
    /// the working copy is staged as a deletion. The index is reset to the
    /// branch tip first, so nothing else leaks into the commit, and the
    /// branch ref moves whether or not it is checked out.
    ///
    /// # Errors
    ///
    /// [`ShadowGitError::NothingToCommit`] when the staged tree equals the
    /// tip's tree and `allow_empty` is false.
    pub fn commit_paths_to_branch(
        &self,
        branch: &str,
        paths: &[&Path],
        message: &str,
        allow_empty: bool,
    ) -> Result<CommitResult> {
        let parent = self.branch_tip_commit(branch)?;
        let parent_tree = parent
            .tree()
            .map_err(|e| ShadowGitError::CommitCreation(e.message().to_string()))?;

        let mut index = self
            .repo
            .index()
            .map_err(|e| ShadowGitError::IndexAccess(e.message().to_string()))?;
        index
            .read_tree(&parent_tree)
            .map_err(|e| ShadowGitError::IndexAccess(e.message().to_string()))?;

        for path in paths {
            if path.is_absolute() {
                return Err(ShadowGitError::InvalidPath(path.display().to_string()));
            }
            if self.workdir.join(path).symlink_metadata().is_ok() {
                index
                    .add_path(path)
                    .map_err(|e| ShadowGitError::IndexWrite(e.message().to_string()))?;
            } else {
                index
                    .remove_path(path)
                    .map_err(|e| ShadowGitError::IndexWrite(e.message().to_string()))?;
            }
        }

        index
            .write()
            .map_err(|e| ShadowGitError::IndexWrite(e.message().to_string()))?;
        let tree_oid = index
            .write_tree()
            .map_err(|e| ShadowGitError::IndexWrite(e.message().to_string()))?;

        if !allow_empty && tree_oid == parent_tree.id() {
            return Err(ShadowGitError::NothingToCommit);
        }

        let tree = self
            .repo
            .find_tree(tree_oid)
            .map_err(|e| ShadowGitError::CommitCreation(e.message().to_string()))?;
        let signature = Signature::now(&self.identity.author_name, &self.identity.author_email)
            .map_err(|e| ShadowGitError::CommitCreation(e.message().to_string()))?;

        let oid = self
            .repo
            .commit(
                Some(&local_ref(branch)),
                &signature,
                &signature,
                message,
                &tree,
                &[&parent],
            )
            .map_err(|e| ShadowGitError::CommitCreation(e.message().to_string()))?;

        let oid_str = oid.to_string();
        let short_oid = oid_str[..7.min(oid_str.len())].to_string();
        debug!(branch = %branch, oid = %short_oid, "committed");

        Ok(CommitResult {
            oid: oid_str,
            short_oid,
            branch: branch.to_string(),
        })
    }

    /// Rename `old` to `new`, keeping its history.
    ///
    /// If either name is checked out, the base branch is checked out first
    /// so HEAD never points at a ref that is about to disappear.
    pub fn rename_branch(&self, old: &str, new: &str) -> Result<()> {
        if !self.branch_exists(old)? {
            return Err(ShadowGitError::BranchNotFound(old.to_string()));
        }
        if self.branch_exists(new)? {
            return Err(ShadowGitError::BranchExists(new.to_string()));
        }

        self.park_head_if_on(&[old, new])?;

        let mut branch = self.find_branch(old)?;
        branch
            .rename(new, false)
            .map_err(|e| ShadowGitError::BranchRename(e.message().to_string()))?;

        debug!(from = %old, to = %new, "renamed branch");
        Ok(())
    }

    /// Delete a local branch.
    pub fn delete_branch(&self, name: &str) -> Result<()> {
        if !self.branch_exists(name)? {
            return Err(ShadowGitError::BranchNotFound(name.to_string()));
        }

        self.park_head_if_on(&[name])?;

        let mut branch = self.find_branch(name)?;
        branch
            .delete()
            .map_err(|e| ShadowGitError::BranchDelete(e.message().to_string()))?;

        debug!(branch = %name, "deleted branch");
        Ok(())
    }

    fn park_head_if_on(&self, names: &[&str]) -> Result<()> {
        let base = self.identity.base_branch.as_str();
        match self.current_branch() {
            Some(current) if names.contains(&current.as_str()) => {
                if names.contains(&base) {
                    return Err(ShadowGitError::Checkout(format!(
                        "cannot move HEAD off base branch {}",
                        base
                    )));
                }
                self.checkout_branch(base)
            }
            _ => Ok(()),
        }
    }

    /// All local branch names, sorted.
    pub fn list_branches(&self) -> Result<Vec<String>> {
        let branches = self
            .repo
            .branches(Some(BranchType::Local))
            .map_err(|e| ShadowGitError::BranchList(e.message().to_string()))?;

        let mut names = Vec::new();
        for branch in branches {
            let (branch, _) = branch.map_err(|e| ShadowGitError::BranchList(e.message().to_string()))?;
            if let Ok(Some(name)) = branch.name() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    pub(crate) fn repo(&self) -> &Repository {
        &self.repo
    }
}
