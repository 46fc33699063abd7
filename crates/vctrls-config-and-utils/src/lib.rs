//! Core configuration, runtime paths, and logging bootstrap for vctrls.

mod config;
mod logging;
mod paths;

pub use config::{
    Config, ConfigError, ConfigResult, DEFAULT_AUTHOR_EMAIL, DEFAULT_AUTHOR_NAME,
    DEFAULT_BASE_BRANCH, DEFAULT_LOG_LEVEL, DEFAULT_MAX_FILE_SIZE, DEFAULT_REMOTE_NAME,
    SHADOW_DIR_NAME,
};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
