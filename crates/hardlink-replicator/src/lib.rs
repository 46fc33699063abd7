//! # Hardlink Replicator
//!
//! Mirrors source files into the shadow working copy as hard links rather
//! than copies, so the shadow tree costs no extra storage and an in-place
//! edit of a source file is immediately visible to the shadow repository.
//!
//! ```text
//! <watch_root>/src/main.rs  ──hard link──►  <shadow>/base/src/main.rs
//! ```
//!
//! The crate also provides the one-shot tree utilities used by the CLI:
//! file maps, directory diffs, tree listings, and working-copy cleanup.

mod error;
mod identity;
mod link;
mod shadow;
mod walk;

pub use error::ReplicateError;
pub use identity::{default_identity, is_same_file, FileIdentity, MetadataIdentity};
#[cfg(unix)]
pub use identity::InodeIdentity;
pub use link::{create_hardlink, remove_if_exists};
pub use shadow::{ShadowTree, SHADOW_BASE_DIR};
pub use walk::{
    build_file_map, build_tree, clean_files, clean_working_tree, diff_dirs, DirNode, FileMap,
    FileMeta,
};

pub type Result<T> = std::result::Result<T, ReplicateError>;
