//! Daemon initialization.

use std::path::PathBuf;

use fs_event_source::{EventFilter, EventSource};
use ignore_list::IgnoreMatcher;
use reconcile_engine::{Engine, EngineSettings};
use shadow_git::{discover_head_file, init_repository, RepoIdentity, ShadowRepository};
use tokio::sync::mpsc;
use tracing::{info, warn};
use vctrls_config_and_utils::{Config, Paths};

use super::pid;

/// Overrides for the watched locations.
#[derive(Debug, Default, clap::Args)]
pub struct WatchArgs {
    /// Source tree to watch
    #[arg(long)]
    pub root: Option<PathBuf>,
    /// Shadow repository receiving commits
    #[arg(long)]
    pub shadow: Option<PathBuf>,
    /// HEAD file of the primary project
    #[arg(long)]
    pub head_file: Option<PathBuf>,
    /// Untracked files at or above this many bytes are skipped
    #[arg(long)]
    pub max_file_size: Option<u64>,
    /// Branch new per-file branches fork from
    #[arg(long)]
    pub base_branch: Option<String>,
}

impl WatchArgs {
    pub fn apply(self, config: &mut Config) {
        if let Some(root) = self.root {
            config.watch_root = Some(root);
        }
        if let Some(shadow) = self.shadow {
            config.shadow_repo = Some(shadow);
        }
        if let Some(head_file) = self.head_file {
            config.head_file = Some(head_file);
        }
        if let Some(size) = self.max_file_size {
            config.max_file_size = size;
        }
        if let Some(branch) = self.base_branch {
            config.base_branch = branch;
        }
    }
}

/// Locations the daemon works with, resolved from config.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub watch_root: PathBuf,
    pub shadow_path: PathBuf,
    pub head_file: PathBuf,
    pub ignore_patterns_file: PathBuf,
    pub ignore_list_file: PathBuf,
    pub identity: RepoIdentity,
}

impl Workspace {
    pub fn resolve(config: &Config) -> Result<Self, Box<dyn std::error::Error>> {
        let root = config.resolved_watch_root()?;
        let watch_root = root
            .canonicalize()
            .map_err(|e| format!("Cannot open watch root {}: {}", root.display(), e))?;

        let head_file = match &config.head_file {
            Some(path) => path.clone(),
            None => discover_head_file(&watch_root).map_err(|_| {
                format!(
                    "No git repository at or above {}; pass --head-file",
                    watch_root.display()
                )
            })?,
        };
        // Event paths are canonical, so HEAD must be too.
        let head_file = head_file.canonicalize().unwrap_or(head_file);

        let mut resolved = config.clone();
        resolved.watch_root = Some(watch_root.clone());

        Ok(Self {
            shadow_path: resolved.resolved_shadow_repo()?,
            ignore_patterns_file: resolved.resolved_ignore_patterns_file()?,
            ignore_list_file: resolved.resolved_ignore_list_file()?,
            watch_root,
            head_file,
            identity: RepoIdentity {
                base_branch: config.base_branch.clone(),
                author_name: config.author_name.clone(),
                author_email: config.author_email.clone(),
            },
        })
    }

    pub fn open_shadow(&self) -> Result<ShadowRepository, Box<dyn std::error::Error>> {
        let repo = ShadowRepository::open(&self.shadow_path, self.identity.clone()).map_err(|e| {
            if e.is_not_found() {
                format!(
                    "No shadow repository at {}; run 'vctrls init' first",
                    self.shadow_path.display()
                )
            } else {
                e.to_string()
            }
        })?;
        Ok(repo)
    }
}

/// Run the daemon until Ctrl-C or SIGTERM.
pub async fn run_daemon(
    mut config: Config,
    paths: Paths,
    args: WatchArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    args.apply(&mut config);

    // Singleton enforcement
    let pid_file = paths.pid_file();
    if let Some(pid) = pid::running_pid(&pid_file) {
        eprintln!(
            "Error: vctrls is already running (PID {}). Use 'vctrls stop' to stop it first.",
            pid
        );
        std::process::exit(1);
    }
    pid::remove_pid(&pid_file);

    let ws = Workspace::resolve(&config)?;
    info!(
        root = %ws.watch_root.display(),
        shadow = %ws.shadow_path.display(),
        head = %ws.head_file.display(),
        max_file_size = config.max_file_size,
        "Starting vctrls"
    );

    if init_repository(&ws.shadow_path, &ws.identity)? {
        info!(path = %ws.shadow_path.display(), "Created shadow repository");
    }
    let shadow_path = ws.shadow_path.canonicalize()?;
    let repo = ShadowRepository::open(&shadow_path, ws.identity.clone())?;

    let matcher = IgnoreMatcher::load(&ws.watch_root, Some(&ws.ignore_patterns_file));
    let filter = EventFilter::new()
        .with_patterns(&ws.watch_root, matcher.clone())
        .exclude(&shadow_path);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let source = EventSource::new(tx, filter)?;
    source.add_recursive_watch(&ws.watch_root)?;
    source.add_watch(&ws.head_file)?;

    let settings = EngineSettings {
        watch_root: ws.watch_root.clone(),
        head_file: ws.head_file.clone(),
        max_file_size: config.max_file_size,
        base_branch: config.base_branch.clone(),
        ignore_list_file: ws.ignore_list_file.clone(),
    };
    let mut engine = Engine::new(repo, settings)
        .with_matcher(matcher)
        .with_head_watch(Box::new(source.clone()));

    let pid = pid::write_pid(&pid_file)?;
    info!(pid = pid, "vctrls started");

    let mut worker = tokio::task::spawn_blocking(move || engine.run(&mut rx));

    let joined = tokio::select! {
        signal = shutdown_signal() => {
            if let Err(e) = signal {
                warn!(error = %e, "Signal handler failed");
            }
            info!("Shutdown requested");
            source.shutdown();
            (&mut worker).await
        }
        joined = &mut worker => joined,
    };

    // Cleanup
    drop(source);
    pid::remove_pid(&pid_file);

    let stats = joined.map_err(|e| format!("Engine worker failed: {}", e))?;
    info!(
        processed = stats.processed,
        failed = stats.failed,
        "vctrls stopped"
    );
    Ok(())
}

async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = terminate.recv() => Ok(()),
    }
}
