use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Property key carrying the source path of a move.
pub const OLD_PATH_PROPERTY: &str = "OldPath";

/// What happened to a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum FsEventKind {
    Create,
    Modify,
    Move { old_path: PathBuf },
    Remove,
}

/// One filesystem change, consumed exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FsEvent {
    #[serde(flatten)]
    pub kind: FsEventKind,
    pub path: PathBuf,
    pub timestamp: DateTime<Utc>,
}

impl FsEvent {
    pub fn new(kind: FsEventKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn create(path: impl Into<PathBuf>) -> Self {
        Self::new(FsEventKind::Create, path)
    }

    pub fn modify(path: impl Into<PathBuf>) -> Self {
        Self::new(FsEventKind::Modify, path)
    }

    pub fn moved(old_path: impl Into<PathBuf>, path: impl Into<PathBuf>) -> Self {
        Self::new(
            FsEventKind::Move {
                old_path: old_path.into(),
            },
            path,
        )
    }

    pub fn remove(path: impl Into<PathBuf>) -> Self {
        Self::new(FsEventKind::Remove, path)
    }

    /// Short name for logging.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            FsEventKind::Create => "create",
            FsEventKind::Modify => "modify",
            FsEventKind::Move { .. } => "move",
            FsEventKind::Remove => "remove",
        }
    }

    /// String-keyed view of event properties. Only `OldPath` is defined.
    pub fn property(&self, key: &str) -> Option<&Path> {
        match (&self.kind, key) {
            (FsEventKind::Move { old_path }, OLD_PATH_PROPERTY) => Some(old_path),
            _ => None,
        }
    }
}

/// What travels on the source's channel.
#[derive(Debug, Clone)]
pub enum WatchMessage {
    Event(FsEvent),
    Error(String),
    /// Sent by the channel's owner to stop the consumer.
    Shutdown,
}
