//! Per-file branch names.
//!
//! A branch is keyed by the primary project's current branch and the
//! file's path relative to the watch root:
//!
//! ```text
//! ("refs/heads/feature/login", "src/app/main.rs")  ->  "feature---login/src---app---main.rs"
//! ```
//!
//! `/` becomes `---` so each half is a single ref component. Characters
//! git forbids in ref names, `%`, and any `-` that could blur a `---`
//! separator are percent-escaped, which keeps the encoding reversible.

use std::path::{Path, PathBuf};

const SEPARATOR: &str = "---";

/// Segment used when the primary project has no branch checked out.
pub const DETACHED_SEGMENT: &str = "detached";

fn push_escaped(out: &mut String, c: char) {
    let mut buf = [0u8; 4];
    for byte in c.encode_utf8(&mut buf).bytes() {
        out.push_str(&format!("%{:02X}", byte));
    }
}

fn escape_segment(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());

    for (i, &c) in chars.iter().enumerate() {
        let prev = i.checked_sub(1).map(|j| chars[j]);
        let next = chars.get(i + 1).copied();

        let escape = match c {
            '/' => {
                out.push_str(SEPARATOR);
                continue;
            }
            '%' | ' ' | '~' | '^' | ':' | '?' | '*' | '[' | '\\' | '@' => true,
            '-' => matches!(prev, Some('-' | '/')) || matches!(next, Some('-' | '/')),
            '.' => i == 0 || prev == Some('.') || next.is_none(),
            c => c.is_control(),
        };

        if escape {
            push_escaped(&mut out, c);
        } else {
            out.push(c);
        }
    }

    if out.ends_with(".lock") {
        let dot = out.len() - ".lock".len();
        out.replace_range(dot..dot + 1, "%2E");
    }
    out
}

fn unescape_segment(encoded: &str) -> Option<String> {
    let bytes = encoded.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i..].starts_with(SEPARATOR.as_bytes()) {
            out.push(b'/');
            i += SEPARATOR.len();
        } else if bytes[i] == b'%' {
            let hex = encoded.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8(out).ok()
}

fn path_to_slash(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Bare branch name of the primary project, from a HEAD reference or a bare name.
fn main_segment(main_branch: &str) -> String {
    let trimmed = main_branch.trim();
    let short = shadow_git::short_name(trimmed);
    let name = if !short.is_empty() {
        short
    } else if trimmed.is_empty() || trimmed.starts_with("ref:") || trimmed.starts_with("refs/") {
        DETACHED_SEGMENT.to_string()
    } else {
        trimmed.to_string()
    };
    escape_segment(&name)
}

/// Branch that records the history of `rel_path` while the primary
/// project is on `main_branch`.
///
/// `main_branch` may be a long ref (`refs/heads/x`), raw HEAD contents
/// (`ref: refs/heads/x`), or a bare name. Pure and stable across restarts.
pub fn branch_name_for(main_branch: &str, rel_path: &Path) -> String {
    format!(
        "{}/{}",
        main_segment(main_branch),
        escape_segment(&path_to_slash(rel_path))
    )
}

/// Invert [`branch_name_for`] into `(main_branch, rel_path)`.
///
/// Returns `None` for names this crate did not produce.
pub fn decode_branch_name(name: &str) -> Option<(String, PathBuf)> {
    let (main, path) = name.split_once('/')?;
    if main.is_empty() || path.is_empty() || path.contains('/') {
        return None;
    }
    Some((unescape_segment(main)?, PathBuf::from(unescape_segment(path)?)))
}

/// Slash-separated form of a relative path, as stored in the ignore list
/// and in commit messages.
pub fn display_path(rel: &Path) -> String {
    path_to_slash(rel)
}
