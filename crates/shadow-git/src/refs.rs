//! HEAD reference normalization.
//!
//! A HEAD file holds either `ref: refs/heads/<name>` or a bare commit id
//! when detached. Anything that is not a branch reference normalizes to
//! the empty string, which callers read as "no known branch yet".

const SYMREF_PREFIX: &str = "ref: ";
const HEADS_PREFIX: &str = "refs/heads/";

/// Bare branch name from `ref: refs/heads/<name>` or `refs/heads/<name>`.
pub fn short_name(reference: &str) -> String {
    let reference = reference.trim();
    let reference = reference.strip_prefix(SYMREF_PREFIX).unwrap_or(reference);
    reference
        .strip_prefix(HEADS_PREFIX)
        .unwrap_or_default()
        .to_string()
}

/// Canonical long form `refs/heads/<name>`.
pub fn long_name(reference: &str) -> String {
    let reference = reference.trim();
    let reference = reference.strip_prefix(SYMREF_PREFIX).unwrap_or(reference);
    if reference.starts_with(HEADS_PREFIX) && reference.len() > HEADS_PREFIX.len() {
        reference.to_string()
    } else {
        String::new()
    }
}
