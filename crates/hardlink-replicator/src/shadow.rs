//! The `base/` replica inside the shadow working copy.

use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::identity::{default_identity, FileIdentity};
use crate::link::{create_hardlink, remove_if_exists};
use crate::{ReplicateError, Result};

/// Directory under the shadow working copy that mirrors the source tree.
pub const SHADOW_BASE_DIR: &str = "base";

/// Maps source-relative paths onto `<workdir>/base/<rel>` and keeps those
/// entries hard-linked to their sources.
pub struct ShadowTree {
    workdir: PathBuf,
    identity: Box<dyn FileIdentity>,
}

impl std::fmt::Debug for ShadowTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShadowTree")
            .field("workdir", &self.workdir)
            .finish_non_exhaustive()
    }
}

/// Reject anything that could escape the shadow tree.
pub(crate) fn check_relative(rel: &Path) -> Result<()> {
    let ok = !rel.as_os_str().is_empty()
        && rel.components().all(|c| matches!(c, Component::Normal(_)));
    if ok {
        Ok(())
    } else {
        Err(ReplicateError::InvalidPath(rel.to_path_buf()))
    }
}

impl ShadowTree {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self::with_identity(workdir, default_identity())
    }

    pub fn with_identity(workdir: impl Into<PathBuf>, identity: Box<dyn FileIdentity>) -> Self {
        Self {
            workdir: workdir.into(),
            identity,
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// `base/<rel>`, relative to the working copy root. This is what gets committed.
    pub fn repo_path(&self, rel: &Path) -> Result<PathBuf> {
        check_relative(rel)?;
        Ok(Path::new(SHADOW_BASE_DIR).join(rel))
    }

    /// Absolute location of the shadow entry for `rel`.
    pub fn shadow_path(&self, rel: &Path) -> Result<PathBuf> {
        Ok(self.workdir.join(self.repo_path(rel)?))
    }

    /// Whether the shadow entry for `rel` is the same file as `src`.
    pub fn is_linked(&self, src: &Path, rel: &Path) -> Result<bool> {
        let shadow = self.shadow_path(rel)?;
        self.identity.same_file(src, &shadow)
    }

    /// Make the shadow entry for `rel` a hard link to `src`.
    ///
    /// Creates missing parent directories and replaces a stale entry.
    pub fn link(&self, src: &Path, rel: &Path) -> Result<PathBuf> {
        let shadow = self.shadow_path(rel)?;
        let parent = shadow
            .parent()
            .ok_or_else(|| ReplicateError::InvalidPath(rel.to_path_buf()))?;

        // The link takes the source's file name, which must match rel's.
        if src.file_name() != rel.file_name() {
            return Err(ReplicateError::InvalidPath(rel.to_path_buf()));
        }

        fs::create_dir_all(parent).map_err(ReplicateError::io(parent))?;
        if remove_if_exists(&shadow)? {
            debug!(path = %shadow.display(), "removed stale shadow entry");
        }
        create_hardlink(src, parent)
    }

    /// Remove the shadow entry for `rel`. Returns whether it existed.
    pub fn unlink(&self, rel: &Path) -> Result<bool> {
        let shadow = self.shadow_path(rel)?;
        let removed = remove_if_exists(&shadow)?;
        if removed {
            debug!(path = %shadow.display(), "unlinked shadow entry");
        }
        Ok(removed)
    }
}
