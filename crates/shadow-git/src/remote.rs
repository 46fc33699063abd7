//! Remote management and push.

use git2::ErrorCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ShadowGitError;
use crate::repository::ShadowRepository;
use crate::Result;

/// Result of a push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushResult {
    pub remote: String,
    /// False when the remote already had every branch.
    pub updated: bool,
}

impl ShadowRepository {
    /// Add a remote.
    pub fn add_remote(&self, name: &str, url: &str) -> Result<()> {
        self.repo()
            .remote(name, url)
            .map_err(|e| ShadowGitError::Remote(e.message().to_string()))?;
        debug!(remote = %name, url = %url, "added remote");
        Ok(())
    }

    /// Point an existing remote at a new URL.
    pub fn update_remote(&self, name: &str, url: &str) -> Result<()> {
        self.remove_remote(name)?;
        self.add_remote(name, url)
    }

    /// Remove a remote.
    pub fn remove_remote(&self, name: &str) -> Result<()> {
        self.repo().remote_delete(name).map_err(|e| {
            if e.code() == ErrorCode::NotFound {
                ShadowGitError::RemoteNotFound(name.to_string())
            } else {
                ShadowGitError::Remote(e.message().to_string())
            }
        })?;
        debug!(remote = %name, "removed remote");
        Ok(())
    }

    /// Configured remotes as `(name, url)` pairs.
    pub fn list_remotes(&self) -> Result<Vec<(String, String)>> {
        let names = self
            .repo()
            .remotes()
            .map_err(|e| ShadowGitError::Remote(e.message().to_string()))?;

        let mut remotes = Vec::new();
        for name in names.iter().flatten() {
            let url = self
                .repo()
                .find_remote(name)
                .ok()
                .and_then(|r| r.url().map(String::from))
                .unwrap_or_default();
            remotes.push((name.to_string(), url));
        }
        Ok(remotes)
    }

    /// Push every local branch to `remote`.
    ///
    /// Shells out to `git push --all` so the user's credential helpers and
    /// SSH agent apply. "Everything up-to-date" counts as success.
    pub fn push(&self, remote: &str) -> Result<PushResult> {
        self.repo().find_remote(remote).map_err(|e| {
            if e.code() == ErrorCode::NotFound {
                ShadowGitError::RemoteNotFound(remote.to_string())
            } else {
                ShadowGitError::Remote(e.message().to_string())
            }
        })?;

        let output = std::process::Command::new("git")
            .args(["push", "--all", remote])
            .current_dir(self.workdir())
            .output()
            .map_err(|e| ShadowGitError::PushFailed(format!("Failed to execute git push: {}", e)))?;

        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let stderr_lower = stderr.to_lowercase();

        if output.status.success() {
            let updated = !stderr_lower.contains("everything up-to-date");
            info!(remote = %remote, updated, "push complete");
            return Ok(PushResult {
                remote: remote.to_string(),
                updated,
            });
        }

        categorize_push_failure(remote, &stderr)
    }
}

fn categorize_push_failure(remote: &str, stderr: &str) -> Result<PushResult> {
    let stderr_lower = stderr.to_lowercase();

    if stderr_lower.contains("authentication")
        || stderr_lower.contains("permission denied")
        || stderr_lower.contains("could not read")
        || stderr_lower.contains("403")
        || stderr_lower.contains("401")
    {
        return Err(ShadowGitError::AuthRequired(remote.to_string()));
    }

    if stderr_lower.contains("does not appear to be a git repository")
        || stderr_lower.contains("repository not found")
    {
        return Err(ShadowGitError::RemoteNotFound(remote.to_string()));
    }

    if stderr_lower.contains("everything up-to-date") {
        return Ok(PushResult {
            remote: remote.to_string(),
            updated: false,
        });
    }

    Err(ShadowGitError::PushFailed(stderr.trim().to_string()))
}
