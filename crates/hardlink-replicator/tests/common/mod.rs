#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temp dir with `src/` and `shadow/` subdirectories.
pub fn source_and_shadow() -> (TempDir, PathBuf, PathBuf) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let src = dir.path().join("src");
    let shadow = dir.path().join("shadow");
    fs::create_dir_all(&src).expect("failed to create src");
    fs::create_dir_all(shadow.join(".git")).expect("failed to create shadow");
    (dir, src, shadow)
}

/// Create a file with the given content, creating parent directories.
pub fn create_file(root: &Path, name: &str, content: &str) -> PathBuf {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("failed to create parent dirs");
    }
    fs::write(&path, content).expect("failed to write file");
    path
}
