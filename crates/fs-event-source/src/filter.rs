//! Which translated events reach the consumer.

use ignore_list::IgnoreMatcher;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use crate::event::{FsEvent, FsEventKind};

const GIT_DIR: &str = ".git";

/// Drops events under `.git`, under excluded prefixes, or matching the
/// ignore patterns. Files registered with a single-file watch always pass,
/// even when they live inside `.git`.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    root: Option<PathBuf>,
    matcher: IgnoreMatcher,
    excluded: Vec<PathBuf>,
    explicit: HashSet<PathBuf>,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply gitignore-style patterns to paths under `root`.
    pub fn with_patterns(mut self, root: impl Into<PathBuf>, matcher: IgnoreMatcher) -> Self {
        self.root = Some(root.into());
        self.matcher = matcher;
        self
    }

    /// Drop everything at or below `prefix`.
    pub fn exclude(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.excluded.push(prefix.into());
        self
    }

    pub(crate) fn allow_file(&mut self, path: &Path) {
        self.explicit.insert(path.to_path_buf());
    }

    pub(crate) fn forget_file(&mut self, path: &Path) {
        self.explicit.remove(path);
    }

    /// Whether events for `path` should be emitted.
    pub fn accepts(&self, path: &Path) -> bool {
        if self.explicit.contains(path) {
            return true;
        }
        if path
            .components()
            .any(|c| matches!(c, Component::Normal(name) if name == GIT_DIR))
        {
            return false;
        }
        if self.excluded.iter().any(|prefix| path.starts_with(prefix)) {
            return false;
        }
        match &self.root {
            Some(root) => match path.strip_prefix(root) {
                Ok(rel) => !self.matcher.matches(rel, path.is_dir()),
                Err(_) => true,
            },
            None => true,
        }
    }

    /// Filter one event. A move with only one visible side degrades to a
    /// Create or Remove of that side.
    pub fn apply(&self, event: FsEvent) -> Option<FsEvent> {
        match &event.kind {
            FsEventKind::Move { old_path } => {
                match (self.accepts(old_path), self.accepts(&event.path)) {
                    (true, true) => Some(event),
                    (false, true) => Some(FsEvent {
                        kind: FsEventKind::Create,
                        ..event
                    }),
                    (true, false) => Some(FsEvent {
                        kind: FsEventKind::Remove,
                        path: old_path.clone(),
                        timestamp: event.timestamp,
                    }),
                    (false, false) => None,
                }
            }
            _ => self.accepts(&event.path).then_some(event),
        }
    }
}
