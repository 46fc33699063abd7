//! File system paths for vctrls runtime files.

use crate::{ConfigError, ConfigResult};
use std::path::PathBuf;

/// Manages file system paths for the daemon and CLI.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory for runtime files (~/.vctrls)
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.vctrls`.
    pub fn new() -> ConfigResult<Self> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;

        Ok(Self {
            base_dir: home.join(".vctrls"),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.vctrls).
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the config file path (~/.vctrls/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the PID file path (~/.vctrls/daemon.pid).
    pub fn pid_file(&self) -> PathBuf {
        self.base_dir.join("daemon.pid")
    }

    /// Get the logs directory (~/.vctrls/logs).
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Get the central JSONL log file (~/.vctrls/logs/vctrls.jsonl).
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join("vctrls.jsonl")
    }

    /// Ensure all required directories exist.
    pub fn ensure_dirs(&self) -> ConfigResult<()> {
        for dir in [self.base_dir.clone(), self.logs_dir()] {
            std::fs::create_dir_all(&dir)
                .map_err(|source| ConfigError::Write { path: dir, source })?;
        }
        Ok(())
    }
}
