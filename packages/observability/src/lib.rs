//! # Observability
//!
//! Centralized tracing setup for vctrls.
//!
//! Components are **log producers** only. They call [`init_with_config`]
//! once at startup and use the standard `tracing` macros everywhere else.
//! They do not know where the log lines end up.
//!
//! ## Output
//!
//! Every process appends structured JSONL to one central file, by default
//! `~/.vctrls/logs/vctrls.jsonl`, so the daemon and one-shot CLI commands
//! share a single stream:
//!
//! - `tail -f ~/.vctrls/logs/vctrls.jsonl | jq` for pretty JSON
//! - `lnav ~/.vctrls/logs/vctrls.jsonl` for interactive exploration
//!
//! Foreground runs can additionally mirror compact lines to stderr.
//!
//! ## Usage
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "vctrls".into(),
//!     default_level: "debug".into(),
//!     also_stderr: true,
//!     ..Default::default()
//! });
//! tracing::info!("watching");
//! ```

mod writer;

use std::path::PathBuf;

pub use writer::{LogLine, SharedLogFile};

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the component (e.g., "vctrls-daemon", "vctrls-cli").
    /// Recorded on the startup line.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// Optional custom log file path.
    /// Defaults to `~/.vctrls/logs/vctrls.jsonl`.
    pub log_path: Option<PathBuf>,

    /// Also emit logs to stderr for immediate feedback.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Initialize logging with default settings for `service_name`.
pub fn init(service_name: &str) {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    });
}

/// Initialize logging with custom configuration.
///
/// Falls back to stderr-only logging when the central log file cannot be
/// opened, so a read-only home directory never prevents startup.
pub fn init_with_config(config: LogConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{EnvFilter, Layer};

    let log_path = config.log_path.clone().unwrap_or_else(default_log_path);

    let json_layer = match SharedLogFile::open(&log_path) {
        Ok(log_file) => Some(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(true)
                .with_writer(log_file)
                .with_filter(env_filter(&config.default_level)),
        ),
        Err(e) => {
            eprintln!("failed to open log file {}: {}", log_path.display(), e);
            None
        }
    };

    // stderr is always on when the file sink is unavailable
    let stderr_layer = if config.also_stderr || json_layer.is_none() {
        Some(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_file(false)
                .with_line_number(false)
                .compact()
                .with_writer(std::io::stderr)
                .with_filter(env_filter(&config.default_level)),
        )
    } else {
        None
    };

    let installed = tracing_subscriber::registry()
        .with(json_layer)
        .with(stderr_layer)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(
            service = %config.service_name,
            pid = std::process::id(),
            log_path = %log_path.display(),
            "observability initialized"
        );
    }
}

fn env_filter(default_level: &str) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level))
}

/// Central log file location shared by every vctrls process.
pub fn default_log_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".vctrls")
        .join("logs")
        .join("vctrls.jsonl")
}

/// Re-export tracing macros for convenience.
pub use tracing::{debug, error, info, instrument, trace, warn};

/// Re-export Level for advanced filtering.
pub use tracing::Level;
