use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{ReplicateError, Result};

/// Hard-link `src` into `dest_dir` under its own file name.
///
/// The source's permission bits are reapplied through the new entry;
/// some platforms do not carry mode across a fresh link reliably. Fails
/// for directories and when the destination already exists.
pub fn create_hardlink(src: &Path, dest_dir: &Path) -> Result<PathBuf> {
    let meta = fs::metadata(src).map_err(ReplicateError::io(src))?;
    if meta.is_dir() {
        return Err(ReplicateError::IsDirectory(src.to_path_buf()));
    }

    let name = src
        .file_name()
        .ok_or_else(|| ReplicateError::InvalidPath(src.to_path_buf()))?;
    let dest = dest_dir.join(name);

    fs::hard_link(src, &dest).map_err(|source| ReplicateError::Link {
        src: src.to_path_buf(),
        dest: dest.clone(),
        source,
    })?;

    fs::set_permissions(&dest, meta.permissions()).map_err(|source| {
        ReplicateError::Permissions {
            path: dest.clone(),
            source,
        }
    })?;

    debug!(src = %src.display(), dest = %dest.display(), "created hard link");
    Ok(dest)
}

/// Remove a file or directory entry. Returns whether anything was removed.
pub fn remove_if_exists(path: &Path) -> Result<bool> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(ReplicateError::io(path)(e)),
    };

    let removed = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    match removed {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(ReplicateError::io(path)(e)),
    }
}
