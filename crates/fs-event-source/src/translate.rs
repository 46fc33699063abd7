//! Raw `notify` events to [`FsEvent`]s.
//!
//! Renames arrive from inotify as a `From` half, a `To` half, and then a
//! `Both` event, all sharing a tracker cookie. The translator pairs the
//! halves into one Move and drops the trailing `Both`. A `From` that never
//! gets a partner (the file left the watched tree) is flushed as a Remove
//! when the next unrelated event arrives, or when [`EventTranslator::flush`]
//! is called after a quiet period.

use notify::event::{EventKind, ModifyKind, RenameMode};
use notify::Event;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::event::FsEvent;

/// Stateful translator. One per source.
#[derive(Debug, Default)]
pub struct EventTranslator {
    pending_from: HashMap<usize, PathBuf>,
    untracked_from: Option<PathBuf>,
    paired: HashSet<usize>,
}

impl EventTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate one raw event. May yield zero, one, or several events.
    pub fn translate(&mut self, event: &Event) -> Vec<FsEvent> {
        let mut out = Vec::new();
        let tracker = event.tracker();

        let continues_rename = matches!(
            event.kind,
            EventKind::Modify(ModifyKind::Name(RenameMode::To | RenameMode::Both))
        );
        if !continues_rename {
            self.flush_into(&mut out);
        }

        let Some(path) = event.paths.first().cloned() else {
            return out;
        };

        match &event.kind {
            EventKind::Create(_) => out.push(FsEvent::create(path)),

            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => match tracker {
                Some(t) => {
                    self.pending_from.insert(t, path);
                }
                None => self.untracked_from = Some(path),
            },

            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                match self.take_from(tracker) {
                    Some(old) => {
                        if let Some(t) = tracker {
                            self.paired.insert(t);
                        }
                        out.push(FsEvent::moved(old, path));
                    }
                    // moved in from outside the watched tree
                    None => out.push(FsEvent::create(path)),
                }
                self.flush_unrelated(tracker, &mut out);
            }

            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                let already_paired = tracker.is_some_and(|t| self.paired.remove(&t));
                if let Some(t) = tracker {
                    self.pending_from.remove(&t);
                }
                if !already_paired {
                    if let Some(to) = event.paths.get(1).cloned() {
                        out.push(FsEvent::moved(path, to));
                    }
                }
                self.flush_unrelated(tracker, &mut out);
            }

            EventKind::Modify(ModifyKind::Name(_)) => out.push(by_existence(path, false)),
            EventKind::Modify(ModifyKind::Data(_)) => out.push(FsEvent::modify(path)),
            EventKind::Modify(ModifyKind::Any) | EventKind::Modify(ModifyKind::Other) => {
                out.push(by_existence(path, true))
            }
            EventKind::Modify(ModifyKind::Metadata(_)) => {}

            EventKind::Remove(_) => out.push(FsEvent::remove(path)),
            EventKind::Any => out.push(by_existence(path, true)),
            EventKind::Access(_) | EventKind::Other => {}
        }

        out
    }

    /// Emit Removes for every unpaired rename source.
    pub fn flush(&mut self) -> Vec<FsEvent> {
        let mut out = Vec::new();
        self.flush_into(&mut out);
        out
    }

    fn take_from(&mut self, tracker: Option<usize>) -> Option<PathBuf> {
        match tracker {
            Some(t) => self.pending_from.remove(&t),
            None => self.untracked_from.take(),
        }
    }

    fn flush_unrelated(&mut self, tracker: Option<usize>, out: &mut Vec<FsEvent>) {
        let stale: Vec<usize> = self
            .pending_from
            .keys()
            .copied()
            .filter(|t| Some(*t) != tracker)
            .collect();
        for t in stale {
            if let Some(old) = self.pending_from.remove(&t) {
                out.push(FsEvent::remove(old));
            }
        }
    }

    fn flush_into(&mut self, out: &mut Vec<FsEvent>) {
        let mut pending: Vec<PathBuf> = self.pending_from.drain().map(|(_, p)| p).collect();
        pending.sort();
        out.extend(pending.into_iter().map(FsEvent::remove));
        if let Some(old) = self.untracked_from.take() {
            out.push(FsEvent::remove(old));
        }
        self.paired.clear();
    }
}

/// Backends that cannot say what happened get a guess from the filesystem.
fn by_existence(path: PathBuf, as_modify: bool) -> FsEvent {
    if exists(&path) {
        if as_modify {
            FsEvent::modify(path)
        } else {
            FsEvent::create(path)
        }
    } else {
        FsEvent::remove(path)
    }
}

fn exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}
