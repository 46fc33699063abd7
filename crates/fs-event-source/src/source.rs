//! The notify-backed watcher.

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, trace, warn};

use crate::error::SourceError;
use crate::event::WatchMessage;
use crate::filter::EventFilter;
use crate::translate::EventTranslator;

/// How long a rename `From` half waits for its `To` before it is reported
/// as a Remove.
pub const RENAME_PAIR_WINDOW: Duration = Duration::from_millis(100);

enum RawMessage {
    Event(notify::Result<Event>),
    Shutdown,
}

enum After {
    Continue,
    Shutdown,
    Stop,
}

/// Handle to a running watcher. Clones share the same watcher.
///
/// notify's thread hands raw events to a translator thread, which pairs
/// rename halves, filters, and sends to the channel given at construction.
/// Dropping the last handle stops both.
#[derive(Clone)]
pub struct EventSource {
    watcher: Arc<Mutex<RecommendedWatcher>>,
    filter: Arc<Mutex<EventFilter>>,
    raw_tx: Sender<RawMessage>,
    tx: UnboundedSender<WatchMessage>,
}

impl std::fmt::Debug for EventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSource").finish_non_exhaustive()
    }
}

impl EventSource {
    /// Create a watcher with no watches yet.
    ///
    /// # Errors
    ///
    /// Fails when the platform watcher cannot be created, e.g. when the
    /// inotify instance limit is reached.
    pub fn new(tx: UnboundedSender<WatchMessage>, filter: EventFilter) -> Result<Self, SourceError> {
        let filter = Arc::new(Mutex::new(filter));
        let (raw_tx, raw_rx) = mpsc::channel();

        let worker_filter = filter.clone();
        let worker_tx = tx.clone();
        std::thread::Builder::new()
            .name("vctrls-event-translator".to_string())
            .spawn(move || run_translator(raw_rx, worker_filter, worker_tx, RENAME_PAIR_WINDOW))
            .map_err(SourceError::Spawn)?;

        let handler_tx = raw_tx.clone();
        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let _ = handler_tx.send(RawMessage::Event(res));
            },
            notify::Config::default(),
        )
        .map_err(SourceError::Create)?;

        Ok(Self {
            watcher: Arc::new(Mutex::new(watcher)),
            filter,
            raw_tx,
            tx,
        })
    }

    /// Watch a single file. Its events pass the filter unconditionally.
    pub fn add_watch(&self, file: &Path) -> Result<(), SourceError> {
        self.filter.lock().allow_file(file);
        self.watch(file, RecursiveMode::NonRecursive)
    }

    /// Watch a directory tree.
    pub fn add_recursive_watch(&self, dir: &Path) -> Result<(), SourceError> {
        self.watch(dir, RecursiveMode::Recursive)
    }

    fn watch(&self, path: &Path, mode: RecursiveMode) -> Result<(), SourceError> {
        self.watcher
            .lock()
            .watch(path, mode)
            .map_err(|source| SourceError::Watch {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(path = %path.display(), recursive = matches!(mode, RecursiveMode::Recursive), "watching");
        Ok(())
    }

    /// Stop watching `path`.
    pub fn unwatch(&self, path: &Path) -> Result<(), SourceError> {
        self.filter.lock().forget_file(path);
        self.watcher
            .lock()
            .unwatch(path)
            .map_err(|source| SourceError::Unwatch {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(path = %path.display(), "unwatched");
        Ok(())
    }

    /// Re-establish a single-file watch after the file was replaced.
    ///
    /// A stale registration is removed first; its absence is not an error.
    pub fn rewatch(&self, file: &Path) -> Result<(), SourceError> {
        if let Err(e) = self.watcher.lock().unwatch(file) {
            trace!(path = %file.display(), error = %e, "no previous watch to drop");
        }
        self.add_watch(file)
    }

    /// Queue [`WatchMessage::Shutdown`] behind every event already seen,
    /// including Removes for rename halves still waiting for a partner.
    pub fn shutdown(&self) {
        if self.raw_tx.send(RawMessage::Shutdown).is_err() {
            let _ = self.tx.send(WatchMessage::Shutdown);
        }
    }
}

fn run_translator(
    raw_rx: Receiver<RawMessage>,
    filter: Arc<Mutex<EventFilter>>,
    tx: UnboundedSender<WatchMessage>,
    window: Duration,
) {
    let mut translator = EventTranslator::new();

    loop {
        let (events, after) = match raw_rx.recv_timeout(window) {
            Ok(RawMessage::Event(Ok(event))) => (translator.translate(&event), After::Continue),
            Ok(RawMessage::Event(Err(e))) => {
                warn!(error = %e, "watch error");
                if tx.send(WatchMessage::Error(e.to_string())).is_err() {
                    return;
                }
                continue;
            }
            Ok(RawMessage::Shutdown) => (translator.flush(), After::Shutdown),
            // Quiet for a full window: no partner is coming.
            Err(RecvTimeoutError::Timeout) => (translator.flush(), After::Continue),
            Err(RecvTimeoutError::Disconnected) => (translator.flush(), After::Stop),
        };

        let events: Vec<_> = {
            let filter = filter.lock();
            events.into_iter().filter_map(|e| filter.apply(e)).collect()
        };
        for event in events {
            trace!(kind = event.kind_name(), path = %event.path.display(), "fs event");
            if tx.send(WatchMessage::Event(event)).is_err() {
                return;
            }
        }

        match after {
            After::Continue => {}
            After::Shutdown => {
                let _ = tx.send(WatchMessage::Shutdown);
                debug!("event translator stopped");
                return;
            }
            After::Stop => {
                debug!("watcher dropped, event translator stopped");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::FsEventKind;
    use notify::event::{CreateKind, EventKind, ModifyKind, RenameMode};
    use std::path::PathBuf;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn start() -> (Sender<RawMessage>, UnboundedReceiver<WatchMessage>) {
        let (raw_tx, raw_rx) = mpsc::channel();
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let filter = Arc::new(Mutex::new(EventFilter::new()));
        std::thread::spawn(move || run_translator(raw_rx, filter, tx, Duration::from_millis(20)));
        (raw_tx, rx)
    }

    fn moved_out(path: &str) -> RawMessage {
        let event = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::From)))
            .add_path(PathBuf::from(path))
            .set_tracker(4);
        RawMessage::Event(Ok(event))
    }

    fn describe(msg: Option<WatchMessage>) -> String {
        match msg {
            Some(WatchMessage::Event(e)) => format!("{} {}", e.kind_name(), e.path.display()),
            Some(WatchMessage::Error(e)) => format!("error {}", e),
            Some(WatchMessage::Shutdown) => "shutdown".to_string(),
            None => "closed".to_string(),
        }
    }

    #[test]
    fn unpaired_rename_is_removed_once_quiet() {
        let (raw_tx, mut rx) = start();

        raw_tx.send(moved_out("/w/gone.txt")).unwrap();

        match rx.blocking_recv() {
            Some(WatchMessage::Event(e)) => {
                assert_eq!(e.kind, FsEventKind::Remove);
                assert_eq!(e.path, PathBuf::from("/w/gone.txt"));
            }
            other => panic!("expected remove, got {}", describe(other)),
        }
        drop(raw_tx);
    }

    #[test]
    fn shutdown_follows_pending_removes() {
        let (raw_tx, mut rx) = start();

        raw_tx.send(moved_out("/w/gone.txt")).unwrap();
        raw_tx.send(RawMessage::Shutdown).unwrap();

        assert_eq!(describe(rx.blocking_recv()), "remove /w/gone.txt");
        assert_eq!(describe(rx.blocking_recv()), "shutdown");
        assert_eq!(describe(rx.blocking_recv()), "closed");
    }

    #[test]
    fn watch_errors_are_forwarded() {
        let (raw_tx, mut rx) = start();

        raw_tx
            .send(RawMessage::Event(Err(notify::Error::generic("queue overflow"))))
            .unwrap();
        raw_tx
            .send(RawMessage::Event(Ok(Event::new(EventKind::Create(CreateKind::File))
                .add_path(PathBuf::from("/w/a")))))
            .unwrap();

        assert_eq!(describe(rx.blocking_recv()), "error queue overflow");
        assert_eq!(describe(rx.blocking_recv()), "create /w/a");
        drop(raw_tx);
    }

    #[test]
    fn closing_the_raw_channel_flushes_and_stops() {
        let (raw_tx, mut rx) = start();
        raw_tx.send(moved_out("/w/gone.txt")).unwrap();
        drop(raw_tx);

        assert_eq!(describe(rx.blocking_recv()), "remove /w/gone.txt");
        assert_eq!(describe(rx.blocking_recv()), "closed");
    }
}
