//! Decides which paths take part in versioning.
//!
//! Two independent sources of exclusion:
//!
//! - [`IgnoreMatcher`]: static gitignore-style patterns compiled once.
//! - [`IgnoreList`]: a mutable text file of paths skipped for size, which
//!   the engine appends to and removes from as tracking intent changes.
//!
//! [`is_too_large`] is the size predicate feeding the second one.

mod error;
mod list;
mod matcher;
mod size;

pub use error::IgnoreListError;
pub use list::IgnoreList;
pub use matcher::IgnoreMatcher;
pub use size::is_too_large;
