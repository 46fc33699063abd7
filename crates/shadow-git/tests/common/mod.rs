#![allow(dead_code)]

use git2::{BranchType, Repository};
use shadow_git::{init_repository, RepoIdentity, ShadowRepository};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const BASE: &str = shadow_git::DEFAULT_BASE_BRANCH;

/// Create a shadow repo with the initial empty commit on the base branch.
pub fn init_shadow_repo() -> (TempDir, PathBuf, ShadowRepository) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let repo_path = dir.path().join("shadow");

    init_repository(&repo_path, &RepoIdentity::default()).expect("failed to init shadow repo");
    let repo =
        ShadowRepository::open(&repo_path, RepoIdentity::default()).expect("failed to open repo");

    (dir, repo_path, repo)
}

/// Create a file in the working tree with the given content.
pub fn create_file(repo_path: &Path, name: &str, content: &str) {
    let file_path = repo_path.join(name);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).expect("failed to create parent dirs");
    }
    fs::write(&file_path, content).expect("failed to write file");
}

/// Number of commits reachable from a local branch.
pub fn commit_count(repo_path: &Path, branch: &str) -> usize {
    let repo = Repository::open(repo_path).expect("failed to open repo");
    let tip = repo
        .find_branch(branch, BranchType::Local)
        .expect("branch missing")
        .get()
        .peel_to_commit()
        .expect("failed to peel to commit");

    let mut revwalk = repo.revwalk().expect("failed to create revwalk");
    revwalk.push(tip.id()).expect("failed to push tip");
    revwalk.count()
}

/// Paths in the tree at a branch tip.
pub fn tree_paths(repo_path: &Path, branch: &str) -> Vec<String> {
    let repo = Repository::open(repo_path).expect("failed to open repo");
    let tree = repo
        .find_branch(branch, BranchType::Local)
        .expect("branch missing")
        .get()
        .peel_to_tree()
        .expect("failed to peel to tree");

    let mut paths = Vec::new();
    tree.walk(git2::TreeWalkMode::PreOrder, |root, entry| {
        if entry.kind() == Some(git2::ObjectType::Blob) {
            paths.push(format!("{}{}", root, entry.name().unwrap_or("")));
        }
        git2::TreeWalkResult::Ok
    })
    .expect("failed to walk tree");
    paths.sort();
    paths
}

/// Content of a blob at a branch tip.
pub fn blob_content(repo_path: &Path, branch: &str, path: &str) -> String {
    let repo = Repository::open(repo_path).expect("failed to open repo");
    let tree = repo
        .find_branch(branch, BranchType::Local)
        .expect("branch missing")
        .get()
        .peel_to_tree()
        .expect("failed to peel to tree");
    let entry = tree.get_path(Path::new(path)).expect("path not in tree");
    let blob = repo.find_blob(entry.id()).expect("not a blob");
    String::from_utf8_lossy(blob.content()).to_string()
}
