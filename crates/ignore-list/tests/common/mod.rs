#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temp dir holding an ignore list seeded with `initial` content.
pub fn seeded_list(initial: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join(".gitignore");
    fs::write(&path, initial).expect("failed to seed ignore list");
    (dir, path)
}

/// Write `size` zero bytes to `root/name`.
pub fn create_sized_file(root: &Path, name: &str, size: usize) -> PathBuf {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("failed to create parent dirs");
    }
    fs::write(&path, vec![0u8; size]).expect("failed to write file");
    path
}
