//! Whole-tree utilities: file maps, directory diffs, listings, cleanup.
//!
//! These run on demand from the CLI, never on the per-event path.

use ignore_list::IgnoreMatcher;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::link::remove_if_exists;
use crate::shadow::check_relative;
use crate::{ReplicateError, Result};

const GIT_DIR: &str = ".git";

/// Size and permission bits of one entry. Directories carry zero values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FileMeta {
    pub size: u64,
    pub mode: u32,
}

/// Relative path (forward slashes) to metadata.
pub type FileMap = BTreeMap<String, FileMeta>;

fn rel_string(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn mode_of(meta: &fs::Metadata) -> u32 {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode()
    }
    #[cfg(not(unix))]
    {
        if meta.permissions().readonly() {
            0o444
        } else {
            0o644
        }
    }
}

fn is_excluded(root: &Path, entry: &DirEntry, matcher: &IgnoreMatcher) -> bool {
    if entry.file_name() == GIT_DIR {
        return true;
    }
    match entry.path().strip_prefix(root) {
        Ok(rel) => matcher.matches(rel, entry.file_type().is_dir()),
        Err(_) => false,
    }
}

/// Recursively map every non-ignored entry under `root`.
///
/// Ignored directories are not descended into. `.git` is always skipped.
pub fn build_file_map(root: &Path, matcher: &IgnoreMatcher) -> Result<FileMap> {
    let mut map = FileMap::new();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_excluded(root, e, matcher));

    for entry in walker {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(root)
            .map_err(|_| ReplicateError::InvalidPath(entry.path().to_path_buf()))?;

        let meta = if entry.file_type().is_dir() {
            FileMeta::default()
        } else {
            let meta = entry.metadata()?;
            FileMeta {
                size: meta.len(),
                mode: mode_of(&meta),
            }
        };
        map.insert(rel_string(rel), meta);
    }

    debug!(root = %root.display(), entries = map.len(), "built file map");
    Ok(map)
}

/// Paths present under only one of two roots, keyed by the root they belong to.
pub fn diff_dirs(
    a: &Path,
    b: &Path,
    matcher: &IgnoreMatcher,
) -> Result<BTreeMap<PathBuf, BTreeSet<String>>> {
    let map_a = build_file_map(a, matcher)?;
    let map_b = build_file_map(b, matcher)?;

    let only_a: BTreeSet<String> = map_a
        .keys()
        .filter(|k| !map_b.contains_key(*k))
        .cloned()
        .collect();
    let only_b: BTreeSet<String> = map_b
        .keys()
        .filter(|k| !map_a.contains_key(*k))
        .cloned()
        .collect();

    let mut diff = BTreeMap::new();
    diff.insert(a.to_path_buf(), only_a);
    diff.entry(b.to_path_buf()).or_insert(only_b);
    Ok(diff)
}

/// Delete everything directly under `dir` except `.git`. Returns the number
/// of entries removed.
pub fn clean_working_tree(dir: &Path) -> Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(dir).map_err(ReplicateError::io(dir))? {
        let entry = entry.map_err(ReplicateError::io(dir))?;
        if entry.file_name() == GIT_DIR {
            continue;
        }
        if remove_if_exists(&entry.path())? {
            removed += 1;
        }
    }
    debug!(dir = %dir.display(), removed, "cleaned working tree");
    Ok(removed)
}

/// Delete each relative path under `dst`. Missing entries are skipped.
pub fn clean_files<P: AsRef<Path>>(paths: &[P], dst: &Path) -> Result<usize> {
    let mut removed = 0;
    for rel in paths {
        let rel = rel.as_ref();
        check_relative(rel)?;
        if remove_if_exists(&dst.join(rel))? {
            removed += 1;
        }
    }
    Ok(removed)
}

/// One node of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirNode {
    pub name: String,
    /// Relative to the listing root; empty for the root itself.
    pub path: String,
    pub is_dir: bool,
    pub size: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DirNode>,
}

/// Nested listing of `root`, children sorted by name, ignored entries omitted.
pub fn build_tree(root: &Path, matcher: &IgnoreMatcher) -> Result<DirNode> {
    let meta = fs::metadata(root).map_err(ReplicateError::io(root))?;
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| root.display().to_string());

    if !meta.is_dir() {
        return Ok(DirNode {
            name,
            path: String::new(),
            is_dir: false,
            size: meta.len(),
            children: Vec::new(),
        });
    }

    Ok(DirNode {
        name,
        path: String::new(),
        is_dir: true,
        size: 0,
        children: tree_children(root, Path::new(""), matcher)?,
    })
}

fn tree_children(root: &Path, rel: &Path, matcher: &IgnoreMatcher) -> Result<Vec<DirNode>> {
    let dir = root.join(rel);
    let mut entries = Vec::new();
    for entry in fs::read_dir(&dir).map_err(ReplicateError::io(&dir))? {
        entries.push(entry.map_err(ReplicateError::io(&dir))?);
    }
    entries.sort_by_key(|e| e.file_name());

    let mut nodes = Vec::new();
    for entry in entries {
        if entry.file_name() == GIT_DIR {
            continue;
        }
        let file_type = entry.file_type().map_err(ReplicateError::io(entry.path()))?;
        let child_rel = rel.join(entry.file_name());
        if matcher.matches(&child_rel, file_type.is_dir()) {
            continue;
        }

        let node = if file_type.is_dir() {
            DirNode {
                name: entry.file_name().to_string_lossy().to_string(),
                path: rel_string(&child_rel),
                is_dir: true,
                size: 0,
                children: tree_children(root, &child_rel, matcher)?,
            }
        } else {
            let size = entry
                .metadata()
                .map_err(ReplicateError::io(entry.path()))?
                .len();
            DirNode {
                name: entry.file_name().to_string_lossy().to_string(),
                path: rel_string(&child_rel),
                is_dir: false,
                size,
                children: Vec::new(),
            }
        };
        nodes.push(node);
    }
    Ok(nodes)
}
