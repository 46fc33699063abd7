//! File identity: do two paths name the same underlying file?
//!
//! On POSIX this is an inode comparison. Other platforms fall back to a
//! size plus modification time heuristic. The engine only ever talks to
//! the [`FileIdentity`] trait.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::{ReplicateError, Result};

/// Decides whether two paths refer to the same file.
pub trait FileIdentity: Send + Sync {
    /// `a` must exist. A missing `b` is `Ok(false)`: an absent shadow entry
    /// is an expected precondition, not an error.
    fn same_file(&self, a: &Path, b: &Path) -> Result<bool>;
}

fn metadata_or_absent(path: &Path) -> Result<Option<fs::Metadata>> {
    match fs::metadata(path) {
        Ok(meta) => Ok(Some(meta)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ReplicateError::io(path)(e)),
    }
}

/// Device and inode number comparison.
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct InodeIdentity;

#[cfg(unix)]
impl FileIdentity for InodeIdentity {
    fn same_file(&self, a: &Path, b: &Path) -> Result<bool> {
        use std::os::unix::fs::MetadataExt;

        let meta_a = fs::metadata(a).map_err(ReplicateError::io(a))?;
        let Some(meta_b) = metadata_or_absent(b)? else {
            return Ok(false);
        };
        Ok(meta_a.dev() == meta_b.dev() && meta_a.ino() == meta_b.ino())
    }
}

/// Size and modification time comparison, for filesystems without inodes.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetadataIdentity;

impl FileIdentity for MetadataIdentity {
    fn same_file(&self, a: &Path, b: &Path) -> Result<bool> {
        let meta_a = fs::metadata(a).map_err(ReplicateError::io(a))?;
        let Some(meta_b) = metadata_or_absent(b)? else {
            return Ok(false);
        };
        let modified_a = meta_a.modified().ok();
        let modified_b = meta_b.modified().ok();
        Ok(meta_a.len() == meta_b.len() && modified_a.is_some() && modified_a == modified_b)
    }
}

/// The best identity provider for this platform.
pub fn default_identity() -> Box<dyn FileIdentity> {
    #[cfg(unix)]
    {
        Box::new(InodeIdentity)
    }
    #[cfg(not(unix))]
    {
        Box::new(MetadataIdentity)
    }
}

/// Compare two paths with the platform's default provider.
pub fn is_same_file(a: &Path, b: &Path) -> Result<bool> {
    default_identity().same_file(a, b)
}
