//! # Shadow Git: Repository Adapter
//!
//! Native git operations on the vctrls shadow repository using libgit2.
//! The reconciliation engine drives this crate one call at a time: every
//! operation is synchronous and expects exclusive ownership of the shadow
//! working copy.
//!
//! ## Key Operations
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`ShadowRepository::branch_exists`] | Check whether a local branch exists |
//! | [`ShadowRepository::create_branch`] | Fork a branch from another branch or HEAD |
//! | [`ShadowRepository::checkout_branch`] | Force-checkout a branch into the working copy |
//! | [`ShadowRepository::commit_to_branch`] | Stage one path and commit on a branch tip |
//! | [`ShadowRepository::rename_branch`] | Rename a branch, parking HEAD on the base branch |
//! | [`ShadowRepository::push`] | Push every local branch to a remote |
//! | [`init_repository`] | Create a shadow repository with an initial commit |
//! | [`find_parent_repo`] | Locate the primary project's repository |
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   Reconciliation engine                   │
//! │                                                           │
//! │  Create/Modify/Move/Remove ──► ShadowRepository methods   │
//! └──────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                    libgit2 (git2-rs)                      │
//! │                                                           │
//! │  Repository, Branch, Index, Tree, Commit, Remote          │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```ignore
//! use shadow_git::{RepoIdentity, ShadowRepository, DEFAULT_BASE_BRANCH};
//! use std::path::Path;
//!
//! let repo = ShadowRepository::open(Path::new("/srv/project/.vctrls"), RepoIdentity::default())?;
//!
//! if !repo.branch_exists("master/src---main.rs")? {
//!     repo.create_branch("master/src---main.rs", DEFAULT_BASE_BRANCH)?;
//! }
//! repo.checkout_branch("master/src---main.rs")?;
//! repo.commit_to_branch("master/src---main.rs", Path::new("base/src/main.rs"), "File created: src/main.rs", false)?;
//! ```
//!
//! ## Error Handling
//!
//! Operations return [`ShadowGitError`]. Callers branch on
//! [`ShadowGitError::is_not_found`] and [`ShadowGitError::is_conflict`]
//! rather than matching message text.

mod bootstrap;
mod error;
mod refs;
mod remote;
mod repository;

pub use bootstrap::{discover_head_file, find_parent_repo, init_repository, remove_directory};
pub use error::ShadowGitError;
pub use refs::{long_name, short_name};
pub use remote::PushResult;
pub use repository::{CommitResult, RepoIdentity, ShadowRepository, DEFAULT_BASE_BRANCH};

/// Result alias for shadow repository operations.
pub type Result<T> = std::result::Result<T, ShadowGitError>;
