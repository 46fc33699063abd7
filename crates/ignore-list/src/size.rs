use std::path::Path;
use tracing::debug;

/// True when the file at `path` is at least `threshold` bytes.
///
/// Fail-open: if the file cannot be stat'ed the answer is `false`, so a
/// transient stat failure never blocks an event from being processed.
pub fn is_too_large(path: &Path, threshold: u64) -> bool {
    match std::fs::metadata(path) {
        Ok(meta) => meta.len() >= threshold,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "size check failed, treating as small");
            false
        }
    }
}
