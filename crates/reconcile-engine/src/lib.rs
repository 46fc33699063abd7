//! # Reconcile Engine
//!
//! Turns a stream of filesystem events into commits on per-file branches
//! of the shadow repository. Each tracked file `F` of the watch root gets
//! its own branch, keyed by the primary project's current branch:
//!
//! ```text
//! Create F   ──► branch for F forked from base, hard link, "File created: F"
//! Modify F   ──► checkout branch, refresh link, "File modified: F"
//! Move F→G   ──► rename branch, move link, "File moved: G"
//! Remove F   ──► checkout branch, drop link, "File deleted: F"
//! HEAD write ──► re-read the primary branch name
//! ```
//!
//! The engine owns the shadow working copy exclusively. Drive it from a
//! single blocking worker with [`Engine::run`].

mod engine;
mod error;
mod head;
mod naming;
mod store;

pub use engine::{Engine, EngineSettings, EngineStats, Transition};
pub use error::EngineError;
pub use head::{read_main_branch, HeadWatch};
pub use naming::{branch_name_for, decode_branch_name, display_path, DETACHED_SEGMENT};
pub use store::BranchStore;
