//! Static gitignore-style matching.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;
use tracing::{debug, warn};

use crate::IgnoreListError;

/// Compiled gitignore rules rooted at the watch root.
#[derive(Debug, Clone)]
pub struct IgnoreMatcher {
    gitignore: Gitignore,
}

impl IgnoreMatcher {
    /// A matcher that matches nothing.
    pub fn empty() -> Self {
        Self {
            gitignore: Gitignore::empty(),
        }
    }

    /// Compile the rules in `patterns_file`, rooted at `root`.
    ///
    /// A missing file yields an empty matcher. Malformed lines are logged
    /// and skipped; the remaining rules still apply.
    pub fn load(root: &Path, patterns_file: Option<&Path>) -> Self {
        let Some(file) = patterns_file.filter(|f| f.is_file()) else {
            debug!(root = %root.display(), "no ignore patterns file, matching nothing");
            return Self::empty();
        };

        let mut builder = GitignoreBuilder::new(root);
        if let Some(e) = builder.add(file) {
            warn!(file = %file.display(), error = %e, "some ignore patterns were skipped");
        }

        match builder.build() {
            Ok(gitignore) => {
                debug!(file = %file.display(), rules = gitignore.num_ignores(), "loaded ignore patterns");
                Self { gitignore }
            }
            Err(e) => {
                warn!(file = %file.display(), error = %e, "failed to compile ignore patterns");
                Self::empty()
            }
        }
    }

    /// Compile rules from in-memory lines.
    pub fn from_patterns(root: &Path, patterns: &[&str]) -> Result<Self, IgnoreListError> {
        let mut builder = GitignoreBuilder::new(root);
        for pattern in patterns {
            builder
                .add_line(None, pattern)
                .map_err(|e| IgnoreListError::Pattern(e.to_string()))?;
        }
        let gitignore = builder
            .build()
            .map_err(|e| IgnoreListError::Pattern(e.to_string()))?;
        Ok(Self { gitignore })
    }

    /// Whether `rel_path` (relative to the root) or any parent directory is ignored.
    pub fn matches(&self, rel_path: &Path, is_dir: bool) -> bool {
        if rel_path.as_os_str().is_empty() || rel_path.has_root() {
            return false;
        }
        self.gitignore
            .matched_path_or_any_parents(rel_path, is_dir)
            .is_ignore()
    }

    pub fn is_empty(&self) -> bool {
        self.gitignore.is_empty()
    }
}

impl Default for IgnoreMatcher {
    fn default() -> Self {
        Self::empty()
    }
}
