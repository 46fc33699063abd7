//! # Filesystem Event Source
//!
//! Turns raw `notify` notifications into a stream of typed [`FsEvent`]s:
//! `Create`, `Modify`, `Move { old_path }`, and `Remove`.
//!
//! ```text
//! notify thread ──► translator thread (EventTranslator ──► EventFilter) ──► mpsc::UnboundedSender<WatchMessage>
//! ```
//!
//! Watch errors travel on the same channel as [`WatchMessage::Error`] so a
//! single consumer sees events and failures in arrival order.
//!
//! Ordering is best effort: the OS only orders events per path, and rapid
//! create/modify pairs may coalesce. Consumers must tolerate both.

mod error;
mod event;
mod filter;
mod source;
mod translate;

pub use error::SourceError;
pub use event::{FsEvent, FsEventKind, WatchMessage, OLD_PATH_PROPERTY};
pub use filter::EventFilter;
pub use source::{EventSource, RENAME_PAIR_WINDOW};
pub use translate::EventTranslator;
