#![allow(dead_code)]

use fs_event_source::SourceError;
use git2::{BranchType, Repository};
use ignore_list::IgnoreList;
use reconcile_engine::{BranchStore, Engine, EngineSettings, HeadWatch};
use shadow_git::{
    init_repository, RepoIdentity, ShadowGitError, ShadowRepository, DEFAULT_BASE_BRANCH,
};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

pub const MAX_FILE_SIZE: u64 = 1024;

/// A primary project with a hand-written HEAD, plus a shadow repository
/// outside of it.
pub struct Fixture {
    _dir: TempDir,
    pub root: PathBuf,
    pub head_file: PathBuf,
    pub shadow_path: PathBuf,
    pub ignore_list_file: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let base = dir.path().canonicalize().expect("failed to canonicalize");

        let root = base.join("project");
        fs::create_dir_all(root.join(".git")).expect("failed to create .git");
        let head_file = root.join(".git").join("HEAD");
        fs::write(&head_file, "ref: refs/heads/main\n").expect("failed to write HEAD");

        let shadow_path = base.join("shadow");
        init_repository(&shadow_path, &RepoIdentity::default()).expect("failed to init shadow");

        Self {
            _dir: dir,
            root,
            head_file,
            ignore_list_file: shadow_path.join(".gitignore"),
            shadow_path,
        }
    }

    pub fn settings(&self) -> EngineSettings {
        EngineSettings {
            watch_root: self.root.clone(),
            head_file: self.head_file.clone(),
            max_file_size: MAX_FILE_SIZE,
            base_branch: DEFAULT_BASE_BRANCH.to_string(),
            ignore_list_file: self.ignore_list_file.clone(),
        }
    }

    pub fn engine(&self) -> Engine<ShadowRepository> {
        let repo = ShadowRepository::open(&self.shadow_path, RepoIdentity::default())
            .expect("failed to open shadow");
        Engine::new(repo, self.settings())
    }

    pub fn fake_engine(&self) -> Engine<FakeStore> {
        let workdir = self.shadow_path.parent().expect("no parent").join("fake");
        fs::create_dir_all(&workdir).expect("failed to create fake workdir");
        Engine::new(FakeStore::new(workdir), self.settings())
    }

    /// Write a source file under the watch root.
    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent dirs");
        }
        fs::write(&path, content).expect("failed to write file");
        path
    }

    pub fn set_head(&self, branch: &str) {
        fs::write(&self.head_file, format!("ref: refs/heads/{}\n", branch))
            .expect("failed to write HEAD");
    }

    pub fn ignore_list(&self) -> IgnoreList {
        IgnoreList::new(&self.ignore_list_file)
    }

    pub fn ignore_list_content(&self) -> String {
        fs::read_to_string(&self.ignore_list_file).unwrap_or_default()
    }
}

fn branch_commit(repo: &Repository, branch: &str) -> git2::Oid {
    repo.find_branch(branch, BranchType::Local)
        .expect("branch missing")
        .get()
        .peel_to_commit()
        .expect("failed to peel to commit")
        .id()
}

pub fn has_branch(repo_path: &Path, branch: &str) -> bool {
    let repo = Repository::open(repo_path).expect("failed to open repo");
    let found = repo.find_branch(branch, BranchType::Local).is_ok();
    found
}

pub fn commit_count(repo_path: &Path, branch: &str) -> usize {
    let repo = Repository::open(repo_path).expect("failed to open repo");
    let mut revwalk = repo.revwalk().expect("failed to create revwalk");
    revwalk
        .push(branch_commit(&repo, branch))
        .expect("failed to push tip");
    revwalk.count()
}

pub fn head_message(repo_path: &Path, branch: &str) -> String {
    let repo = Repository::open(repo_path).expect("failed to open repo");
    let commit = repo
        .find_commit(branch_commit(&repo, branch))
        .expect("failed to find commit");
    commit.message().unwrap_or("").to_string()
}

pub fn tree_paths(repo_path: &Path, branch: &str) -> Vec<String> {
    let repo = Repository::open(repo_path).expect("failed to open repo");
    let commit = repo
        .find_commit(branch_commit(&repo, branch))
        .expect("failed to find commit");
    let tree = commit.tree().expect("failed to get tree");

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

pub fn blob_content(repo_path: &Path, branch: &str, path: &str) -> String {
    let repo = Repository::open(repo_path).expect("failed to open repo");
    let commit = repo
        .find_commit(branch_commit(&repo, branch))
        .expect("failed to find commit");
    let tree = commit.tree().expect("failed to get tree");
    let entry = tree.get_path(Path::new(path)).expect("path not in tree");
    let blob = repo.find_blob(entry.id()).expect("not a blob");
    String::from_utf8_lossy(blob.content()).to_string()
}

type Snapshot = BTreeMap<PathBuf, Vec<u8>>;

/// In-memory branch store. Branches are lists of tree snapshots taken
/// from files in `workdir`; checkout does not touch the disk.
#[derive(Debug)]
pub struct FakeStore {
    workdir: PathBuf,
    branches: RefCell<BTreeMap<String, Vec<Snapshot>>>,
    current: RefCell<Option<String>>,
    pub create_calls: Cell<usize>,
    /// Report every branch as missing, as if another writer raced us.
    pub blind: Cell<bool>,
}

impl FakeStore {
    pub fn new(workdir: PathBuf) -> Self {
        let mut branches = BTreeMap::new();
        branches.insert(DEFAULT_BASE_BRANCH.to_string(), vec![Snapshot::new()]);
        Self {
            workdir,
            branches: RefCell::new(branches),
            current: RefCell::new(Some(DEFAULT_BASE_BRANCH.to_string())),
            create_calls: Cell::new(0),
            blind: Cell::new(false),
        }
    }

    pub fn branch_names(&self) -> Vec<String> {
        self.branches.borrow().keys().cloned().collect()
    }

    pub fn commits(&self, branch: &str) -> usize {
        self.branches.borrow().get(branch).map_or(0, Vec::len)
    }

    pub fn tip(&self, branch: &str) -> Option<Snapshot> {
        self.branches.borrow().get(branch).and_then(|h| h.last().cloned())
    }
}

impl BranchStore for FakeStore {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn current_branch(&self) -> Option<String> {
        self.current.borrow().clone()
    }

    fn branch_exists(&self, name: &str) -> Result<bool, ShadowGitError> {
        if self.blind.get() {
            return Ok(false);
        }
        Ok(self.branches.borrow().contains_key(name))
    }

    fn create_branch(&self, name: &str, from: &str) -> Result<(), ShadowGitError> {
        self.create_calls.set(self.create_calls.get() + 1);
        let mut branches = self.branches.borrow_mut();
        if branches.contains_key(name) {
            return Err(ShadowGitError::BranchExists(name.to_string()));
        }
        let history = branches
            .get(from)
            .cloned()
            .ok_or_else(|| ShadowGitError::BranchNotFound(from.to_string()))?;
        branches.insert(name.to_string(), history);
        Ok(())
    }

    fn checkout_branch(&self, name: &str) -> Result<(), ShadowGitError> {
        if !self.branches.borrow().contains_key(name) {
            return Err(ShadowGitError::BranchNotFound(name.to_string()));
        }
        *self.current.borrow_mut() = Some(name.to_string());
        Ok(())
    }

    fn commit_paths(
        &self,
        branch: &str,
        paths: &[&Path],
        _message: &str,
        allow_empty: bool,
    ) -> Result<String, ShadowGitError> {
        let mut branches = self.branches.borrow_mut();
        let history = branches
            .get_mut(branch)
            .ok_or_else(|| ShadowGitError::BranchNotFound(branch.to_string()))?;

        let parent = history.last().cloned().unwrap_or_default();
        let mut tree = parent.clone();
        for path in paths {
            match fs::read(self.workdir.join(path)) {
                Ok(content) => {
                    tree.insert(path.to_path_buf(), content);
                }
                Err(_) => {
                    tree.remove(*path);
                }
            }
        }

        if tree == parent && !allow_empty {
            return Err(ShadowGitError::NothingToCommit);
        }
        history.push(tree);
        Ok(format!("{:040x}", history.len()))
    }

    fn rename_branch(&self, old: &str, new: &str) -> Result<(), ShadowGitError> {
        let mut branches = self.branches.borrow_mut();
        if branches.contains_key(new) {
            return Err(ShadowGitError::BranchExists(new.to_string()));
        }
        let history = branches
            .remove(old)
            .ok_or_else(|| ShadowGitError::BranchNotFound(old.to_string()))?;
        branches.insert(new.to_string(), history);

        let mut current = self.current.borrow_mut();
        if current.as_deref() == Some(old) {
            *current = Some(DEFAULT_BASE_BRANCH.to_string());
        }
        Ok(())
    }
}

/// Records rewatch calls and fails with "not found" a set number of times.
#[derive(Debug, Clone, Default)]
pub struct FakeWatch {
    pub calls: Arc<AtomicUsize>,
    pub misses: usize,
}

impl FakeWatch {
    pub fn missing_for(misses: usize) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            misses,
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl HeadWatch for FakeWatch {
    fn rewatch(&self, head_file: &Path) -> Result<(), SourceError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.misses {
            return Err(SourceError::Watch {
                path: head_file.to_path_buf(),
                source: notify::Error::path_not_found(),
            });
        }
        Ok(())
    }
}
