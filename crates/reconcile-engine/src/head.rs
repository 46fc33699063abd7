//! Tracking the primary project's checked-out branch.

use fs_event_source::{EventSource, SourceError};
use std::path::Path;

use crate::error::EngineError;

/// Re-arms the single-file watch on the primary project's HEAD file.
///
/// Git replaces HEAD by renaming a lock file over it, which kills a
/// watch on the old inode, so the engine asks for a fresh one.
pub trait HeadWatch {
    fn rewatch(&self, head_file: &Path) -> Result<(), SourceError>;
}

impl HeadWatch for EventSource {
    fn rewatch(&self, head_file: &Path) -> Result<(), SourceError> {
        EventSource::rewatch(self, head_file)
    }
}

/// Long ref name (`refs/heads/<name>`) recorded in `head_file`, or the
/// empty string when HEAD is detached or unrecognized.
pub fn read_main_branch(head_file: &Path) -> Result<String, EngineError> {
    let content = std::fs::read_to_string(head_file).map_err(|source| EngineError::HeadRead {
        path: head_file.to_path_buf(),
        source,
    })?;
    Ok(shadow_git::long_name(&content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn reads_branch_from_head_file() {
        let dir = tempdir().unwrap();
        let head = dir.path().join("HEAD");
        std::fs::write(&head, "ref: refs/heads/feature/x\n").unwrap();

        assert_eq!(read_main_branch(&head).unwrap(), "refs/heads/feature/x");
    }

    #[test]
    fn detached_head_is_empty() {
        let dir = tempdir().unwrap();
        let head = dir.path().join("HEAD");
        std::fs::write(&head, "3f786850e387550fdab836ed7e6dc881de23001b\n").unwrap();

        assert_eq!(read_main_branch(&head).unwrap(), "");
    }

    #[test]
    fn missing_head_is_not_found() {
        let dir = tempdir().unwrap();
        let err = read_main_branch(&dir.path().join("HEAD")).unwrap_err();
        assert!(err.is_not_found());
    }
}
