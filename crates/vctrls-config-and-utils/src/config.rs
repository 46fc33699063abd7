//! Configuration management for vctrls.

use crate::Paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why configuration or runtime paths could not be resolved.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot serialize config: {0}")]
    Serialize(#[source] serde_json::Error),

    /// A value that parsed but cannot be used.
    #[error("Invalid {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },

    #[error("Cannot determine home directory")]
    NoHomeDir,

    #[error("Cannot resolve relative path against the current directory: {0}")]
    CurrentDir(#[source] std::io::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Files at or above this size are skipped until a branch exists for them.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Branch every per-file branch forks from.
///
/// Per-file branches are named `<primary branch>/<path>`, so the base
/// branch must never equal an encoded primary branch name or git refuses
/// the nested ref. Encoded names never contain `--`.
pub const DEFAULT_BASE_BRANCH: &str = "vctrls--base";

/// Author recorded on automatic commits.
pub const DEFAULT_AUTHOR_NAME: &str = "AutoCommit";
pub const DEFAULT_AUTHOR_EMAIL: &str = "autocommit@example.com";

/// Remote used by `vctrls push`.
pub const DEFAULT_REMOTE_NAME: &str = "origin";

/// Shadow repository directory name when placed inside the watch root.
pub const SHADOW_DIR_NAME: &str = ".vctrls";

/// Main vctrls configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Source tree to watch. Relative values resolve against the current directory.
    #[serde(default)]
    pub watch_root: Option<PathBuf>,
    /// Shadow repository receiving automatic commits.
    #[serde(default)]
    pub shadow_repo: Option<PathBuf>,
    /// HEAD file of the primary project. Discovered from `watch_root` when unset.
    #[serde(default)]
    pub head_file: Option<PathBuf>,
    /// Size threshold in bytes for the ignore list.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// gitignore-style patterns excluded from versioning.
    #[serde(default)]
    pub ignore_patterns_file: Option<PathBuf>,
    /// Mutable list of paths skipped for size.
    #[serde(default)]
    pub ignore_list_file: Option<PathBuf>,
    /// Branch new per-file branches fork from.
    #[serde(default = "default_base_branch")]
    pub base_branch: String,
    #[serde(default = "default_author_name")]
    pub author_name: String,
    #[serde(default = "default_author_email")]
    pub author_email: String,
    #[serde(default = "default_remote_name")]
    pub remote_name: String,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_base_branch() -> String {
    DEFAULT_BASE_BRANCH.to_string()
}

fn default_author_name() -> String {
    DEFAULT_AUTHOR_NAME.to_string()
}

fn default_author_email() -> String {
    DEFAULT_AUTHOR_EMAIL.to_string()
}

fn default_remote_name() -> String {
    DEFAULT_REMOTE_NAME.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            watch_root: None,
            shadow_repo: None,
            head_file: None,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            ignore_patterns_file: None,
            ignore_list_file: None,
            base_branch: default_base_branch(),
            author_name: default_author_name(),
            author_email: default_author_email(),
            remote_name: default_remote_name(),
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from `config.json` under `paths`, falling back to defaults.
    pub fn load(paths: &Paths) -> ConfigResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> ConfigResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        let path = paths.config_file();
        std::fs::write(&path, content).map_err(|source| ConfigError::Write { path, source })
    }

    /// Only the log level can be overridden at runtime.
    fn load_from_env(&mut self) {
        if let Ok(log_level) = std::env::var("VCTRLS_LOG_LEVEL") {
            self.log_level = log_level;
        }
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.base_branch.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "base_branch",
                reason: "cannot be empty",
            });
        }
        if self.max_file_size == 0 {
            return Err(ConfigError::Invalid {
                field: "max_file_size",
                reason: "must be greater than zero",
            });
        }
        Ok(())
    }

    /// Watch root, defaulting to the current directory.
    pub fn resolved_watch_root(&self) -> ConfigResult<PathBuf> {
        match &self.watch_root {
            Some(root) => absolutize(root),
            None => std::env::current_dir().map_err(ConfigError::CurrentDir),
        }
    }

    /// Shadow repository path, defaulting to `<watch_root>/.vctrls`.
    pub fn resolved_shadow_repo(&self) -> ConfigResult<PathBuf> {
        match &self.shadow_repo {
            Some(path) => absolutize(path),
            None => Ok(self.resolved_watch_root()?.join(SHADOW_DIR_NAME)),
        }
    }

    /// Pattern file, defaulting to `<watch_root>/.gitignore`.
    pub fn resolved_ignore_patterns_file(&self) -> ConfigResult<PathBuf> {
        match &self.ignore_patterns_file {
            Some(path) => absolutize(path),
            None => Ok(self.resolved_watch_root()?.join(".gitignore")),
        }
    }

    /// Size ignore list, defaulting to `<shadow_repo>/.gitignore`.
    pub fn resolved_ignore_list_file(&self) -> ConfigResult<PathBuf> {
        match &self.ignore_list_file {
            Some(path) => absolutize(path),
            None => Ok(self.resolved_shadow_repo()?.join(".gitignore")),
        }
    }
}

fn absolutize(path: &Path) -> ConfigResult<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()
            .map_err(ConfigError::CurrentDir)?
            .join(path))
    }
}
