//! The event reconciliation engine.
//!
//! One worker drains one queue. Every transition may force-checkout the
//! shadow working copy, so events are applied strictly one at a time and
//! each runs to completion or to its first failure before the next is
//! taken. HEAD-file notifications travel on the same queue as content
//! events, so a branch switch in the primary project is applied between
//! two file events and never during one.
//!
//! Transitions tolerate duplicated and reordered notifications: branch
//! existence and file identity are re-checked on every event instead of
//! assuming a clean history per path.
//!
//! Known hazard: a Move racing a Modify of the same file can be observed
//! in either order. Whichever arrives second acts on the state the first
//! left behind; the outcome is not forced to be consistent.

use fs_event_source::{FsEvent, FsEventKind, WatchMessage};
use hardlink_replicator::ShadowTree;
use ignore_list::{is_too_large, IgnoreList, IgnoreMatcher};
use shadow_git::ShadowGitError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, info, warn};

use crate::error::EngineError;
use crate::head::{read_main_branch, HeadWatch};
use crate::naming::{branch_name_for, display_path};
use crate::store::BranchStore;

const HEAD_REWATCH_ATTEMPTS: u32 = 5;
const HEAD_REWATCH_DELAY: Duration = Duration::from_millis(50);

/// Static inputs, read once at startup.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Source tree being replicated.
    pub watch_root: PathBuf,
    /// HEAD file of the primary project.
    pub head_file: PathBuf,
    /// Untracked files at or above this size are skipped.
    pub max_file_size: u64,
    /// Fork point for new per-file branches.
    pub base_branch: String,
    /// Size ignore list.
    pub ignore_list_file: PathBuf,
}

/// What an event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Committed { branch: String, oid: String },
    /// The staged tree matched the branch tip.
    Unchanged { branch: String },
    SkippedTooLarge { path: String },
    /// Path matched the ignore patterns or lives in the shadow repository.
    Ignored,
    SkippedDirectory,
    /// The file was gone by the time its event was taken off the queue.
    Vanished { path: String },
    MainBranchUpdated { branch: String, changed: bool },
    HeadRewatched { branch: String },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EngineStats {
    pub processed: u64,
    pub failed: u64,
}

pub struct Engine<S: BranchStore> {
    store: S,
    shadow: ShadowTree,
    ignore_list: IgnoreList,
    matcher: IgnoreMatcher,
    settings: EngineSettings,
    main_branch: String,
    head_watch: Option<Box<dyn HeadWatch + Send>>,
    stats: EngineStats,
}

impl<S: BranchStore> Engine<S> {
    /// Build an engine over `store`. The primary branch is read from the
    /// HEAD file now; an unreadable HEAD starts the engine detached.
    pub fn new(store: S, settings: EngineSettings) -> Self {
        let main_branch = match read_main_branch(&settings.head_file) {
            Ok(branch) => branch,
            Err(e) => {
                warn!(error = %e, "could not read primary HEAD, starting detached");
                String::new()
            }
        };

        Self {
            shadow: ShadowTree::new(store.workdir()),
            ignore_list: IgnoreList::new(&settings.ignore_list_file),
            matcher: IgnoreMatcher::empty(),
            store,
            settings,
            main_branch,
            head_watch: None,
            stats: EngineStats::default(),
        }
    }

    pub fn with_matcher(mut self, matcher: IgnoreMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_head_watch(mut self, watch: Box<dyn HeadWatch + Send>) -> Self {
        self.head_watch = Some(watch);
        self
    }

    pub fn with_shadow_tree(mut self, shadow: ShadowTree) -> Self {
        self.shadow = shadow;
        self
    }

    /// Long ref name of the primary project's branch; empty when detached.
    pub fn main_branch(&self) -> &str {
        &self.main_branch
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Branch for `rel` under the current primary branch.
    pub fn branch_for(&self, rel: &Path) -> String {
        branch_name_for(&self.main_branch, rel)
    }

    /// Drain `rx` until it closes or a shutdown arrives. Failures are
    /// logged and never stop the loop.
    pub fn run(&mut self, rx: &mut UnboundedReceiver<WatchMessage>) -> EngineStats {
        info!(root = %self.settings.watch_root.display(), main = %self.main_branch, "engine started");

        while let Some(msg) = rx.blocking_recv() {
            match msg {
                WatchMessage::Event(event) => {
                    self.handle(&event);
                }
                WatchMessage::Error(e) => warn!(error = %e, "event source error"),
                WatchMessage::Shutdown => break,
            }
        }

        info!(
            processed = self.stats.processed,
            failed = self.stats.failed,
            "engine stopped"
        );
        self.stats
    }

    /// Apply one event and log the outcome. Returns `None` on failure.
    pub fn handle(&mut self, event: &FsEvent) -> Option<Transition> {
        self.stats.processed += 1;
        let kind = event.kind_name();
        let path = event.path.display();

        match self.process(event) {
            Ok(transition) => {
                match &transition {
                    Transition::Committed { branch, oid } => {
                        info!(kind, path = %path, branch = %branch, oid = %oid, "committed")
                    }
                    Transition::Unchanged { branch } => {
                        debug!(kind, path = %path, branch = %branch, "content unchanged")
                    }
                    Transition::SkippedTooLarge { .. } => {
                        debug!(kind, path = %path, "skipped, too large")
                    }
                    Transition::Ignored => debug!(kind, path = %path, "ignored"),
                    Transition::SkippedDirectory => debug!(kind, path = %path, "skipped directory"),
                    Transition::Vanished { .. } => {
                        debug!(kind, path = %path, "source gone before it was recorded")
                    }
                    Transition::MainBranchUpdated { branch, changed } => {
                        if *changed {
                            info!(branch = %branch, "primary branch changed")
                        } else {
                            debug!(branch = %branch, "primary HEAD touched")
                        }
                    }
                    Transition::HeadRewatched { branch } => {
                        info!(branch = %branch, "re-established HEAD watch")
                    }
                }
                Some(transition)
            }
            Err(e) => {
                self.stats.failed += 1;
                error!(kind, path = %path, error = %e, "event processing failed");
                None
            }
        }
    }

    /// Apply one event.
    pub fn process(&mut self, event: &FsEvent) -> Result<Transition, EngineError> {
        if event.path == self.settings.head_file {
            return self.on_head_event(&event.kind);
        }
        if let FsEventKind::Move { old_path } = &event.kind {
            if *old_path == self.settings.head_file {
                return self.on_head_event(&FsEventKind::Remove);
            }
        }

        if event.path.starts_with(self.store.workdir()) {
            return Ok(Transition::Ignored);
        }

        let rel = self.relative(&event.path)?;
        if self.matcher.matches(&rel, event.path.is_dir()) {
            return Ok(Transition::Ignored);
        }

        match &event.kind {
            FsEventKind::Create => self.on_create(&event.path, &rel),
            FsEventKind::Modify => self.on_modify(&event.path, &rel),
            FsEventKind::Move { old_path } => {
                let old_rel = self.relative(old_path)?;
                self.on_move(&old_rel, &event.path, &rel)
            }
            FsEventKind::Remove => self.on_remove(&rel),
        }
    }

    fn relative(&self, path: &Path) -> Result<PathBuf, EngineError> {
        match path.strip_prefix(&self.settings.watch_root) {
            Ok(rel) if !rel.as_os_str().is_empty() => Ok(rel.to_path_buf()),
            _ => Err(EngineError::OutsideRoot(path.to_path_buf())),
        }
    }

    fn on_create(&mut self, src: &Path, rel: &Path) -> Result<Transition, EngineError> {
        // Atomic saves create and rename a temp file before we see the create.
        match std::fs::metadata(src) {
            Ok(meta) if meta.is_dir() => return Ok(Transition::SkippedDirectory),
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Transition::Vanished {
                    path: display_path(rel),
                })
            }
            Err(e) => {
                return Err(EngineError::Io {
                    path: src.to_path_buf(),
                    source: e,
                })
            }
        }

        let branch = self.branch_for(rel);
        let entry = display_path(rel);
        let exists = self.store.branch_exists(&branch)?;

        if !exists && is_too_large(src, self.settings.max_file_size) {
            self.ignore_list.append_if_absent(&entry)?;
            info!(path = %entry, limit = self.settings.max_file_size, "file over size limit, not tracking");
            return Ok(Transition::SkippedTooLarge { path: entry });
        }

        if exists {
            self.release_from_ignore_list(&entry)?;
        } else {
            match self.store.create_branch(&branch, &self.settings.base_branch) {
                Ok(()) => debug!(branch = %branch, "created branch"),
                Err(e) if e.is_conflict() => debug!(branch = %branch, "branch already present"),
                Err(e) => return Err(e.into()),
            }
        }

        self.store.checkout_branch(&branch)?;
        if !self.shadow.is_linked(src, rel)? {
            self.shadow.link(src, rel)?;
        }

        self.commit(&branch, &[rel], format!("File created: {}", entry), false)
    }

    fn on_modify(&mut self, src: &Path, rel: &Path) -> Result<Transition, EngineError> {
        if src.is_dir() {
            return Ok(Transition::SkippedDirectory);
        }

        let branch = self.branch_for(rel);
        if !self.store.branch_exists(&branch)? {
            return self.on_create(src, rel);
        }

        let entry = display_path(rel);
        self.release_from_ignore_list(&entry)?;

        // Checking out another branch replaced our link with a blob copy.
        let on_branch = self.store.current_branch().as_deref() == Some(branch.as_str());
        if !on_branch {
            self.store.checkout_branch(&branch)?;
        }
        if !on_branch || !self.shadow.is_linked(src, rel)? {
            self.shadow.link(src, rel)?;
        }

        self.commit(&branch, &[rel], format!("File modified: {}", entry), false)
    }

    fn on_move(&mut self, old_rel: &Path, src: &Path, rel: &Path) -> Result<Transition, EngineError> {
        let old_branch = self.branch_for(old_rel);
        if !self.store.branch_exists(&old_branch)? {
            return self.on_create(src, rel);
        }

        let new_branch = self.branch_for(rel);
        self.store.rename_branch(&old_branch, &new_branch)?;
        self.store.checkout_branch(&new_branch)?;

        self.shadow.unlink(old_rel)?;
        self.shadow.link(src, rel)?;

        // A pure rename still gets a commit; the ref rename alone records nothing.
        self.commit(
            &new_branch,
            &[old_rel, rel],
            format!("File moved: {}", display_path(rel)),
            true,
        )
    }

    fn on_remove(&mut self, rel: &Path) -> Result<Transition, EngineError> {
        let branch = self.branch_for(rel);
        let entry = display_path(rel);
        if !self.store.branch_exists(&branch)? {
            return Err(EngineError::NoBranchForRemove {
                path: entry,
                branch,
            });
        }

        self.store.checkout_branch(&branch)?;
        self.shadow.unlink(rel)?;

        self.commit(&branch, &[rel], format!("File deleted: {}", entry), false)
    }

    fn on_head_event(&mut self, kind: &FsEventKind) -> Result<Transition, EngineError> {
        match kind {
            FsEventKind::Remove => {
                self.rewatch_head()?;
                let branch = self.refresh_main_branch()?;
                Ok(Transition::HeadRewatched { branch })
            }
            _ => {
                let previous = self.main_branch.clone();
                let branch = self.refresh_main_branch()?;
                Ok(Transition::MainBranchUpdated {
                    changed: branch != previous,
                    branch,
                })
            }
        }
    }

    fn refresh_main_branch(&mut self) -> Result<String, EngineError> {
        self.main_branch = read_main_branch(&self.settings.head_file)?;
        Ok(self.main_branch.clone())
    }

    fn rewatch_head(&self) -> Result<(), EngineError> {
        let Some(watch) = &self.head_watch else {
            return Ok(());
        };

        let mut attempt = 1;
        loop {
            match watch.rewatch(&self.settings.head_file) {
                Ok(()) => return Ok(()),
                Err(e) if e.is_not_found() && attempt < HEAD_REWATCH_ATTEMPTS => {
                    debug!(attempt, "HEAD file not back yet");
                    std::thread::sleep(HEAD_REWATCH_DELAY);
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn release_from_ignore_list(&self, entry: &str) -> Result<(), EngineError> {
        if self.ignore_list.remove_line(entry)? {
            info!(path = %entry, "branch exists, removed from ignore list");
        }
        Ok(())
    }

    fn commit(
        &self,
        branch: &str,
        rels: &[&Path],
        message: String,
        allow_empty: bool,
    ) -> Result<Transition, EngineError> {
        let repo_paths = rels
            .iter()
            .map(|rel| self.shadow.repo_path(rel))
            .collect::<Result<Vec<_>, _>>()?;
        let paths: Vec<&Path> = repo_paths.iter().map(PathBuf::as_path).collect();

        match self.store.commit_paths(branch, &paths, &message, allow_empty) {
            Ok(oid) => Ok(Transition::Committed {
                branch: branch.to_string(),
                oid,
            }),
            Err(ShadowGitError::NothingToCommit) => Ok(Transition::Unchanged {
                branch: branch.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}
