//! vctrls - commits every change in a source tree to per-file branches of a shadow repository.

mod app;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use vctrls_config_and_utils::{init_logging, Config, Paths};

/// vctrls command-line interface.
#[derive(Parser)]
#[command(name = "vctrls")]
#[command(about = "Version every file of a source tree on its own branch")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error). Defaults to the configured level
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Base directory for runtime files (config, pid, logs). Defaults to ~/.vctrls
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the source tree and commit changes (default)
    Watch(app::WatchArgs),
    /// Create the shadow repository and write a config file if none exists
    Init(app::WatchArgs),
    /// Stop a running daemon
    Stop,
    /// Show daemon and shadow repository state
    Status,
    /// List tracked files by branch
    Branches,
    /// Show paths present under only one of two directories
    Diff { a: PathBuf, b: PathBuf },
    /// Print a directory tree as JSON
    Tree {
        /// Directory to list. Defaults to the watch root
        path: Option<PathBuf>,
    },
    /// Push every branch of the shadow repository
    Push {
        /// Remote name. Defaults to the configured remote
        remote: Option<String>,
    },
    /// Manage remotes of the shadow repository
    #[command(subcommand)]
    Remote(RemoteCommand),
    /// Delete the shadow working copy, keeping its history
    Clean {
        #[arg(long)]
        yes: bool,
    },
    /// Delete the shadow repository entirely
    Destroy {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum RemoteCommand {
    /// Add a remote
    Add { name: String, url: String },
    /// Point a remote at a new URL
    SetUrl { name: String, url: String },
    /// Remove a remote
    Remove { name: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    paths.ensure_dirs()?;
    let config = Config::load(&paths)?;

    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    let foreground = matches!(cli.command, None | Some(Commands::Watch(_)));
    init_logging("vctrls", level, Some(paths.log_file()), foreground);

    match cli.command {
        None => app::run_daemon(config, paths, app::WatchArgs::default()).await?,
        Some(Commands::Watch(args)) => app::run_daemon(config, paths, args).await?,
        Some(Commands::Init(args)) => app::init_shadow(config, &paths, args)?,
        Some(Commands::Stop) => app::stop_daemon(&paths).await?,
        Some(Commands::Status) => app::check_status(&config, &paths)?,
        Some(Commands::Branches) => app::list_branches(&config)?,
        Some(Commands::Diff { a, b }) => app::diff(&config, &a, &b)?,
        Some(Commands::Tree { path }) => app::tree(&config, path)?,
        Some(Commands::Push { remote }) => app::push(&config, remote)?,
        Some(Commands::Remote(cmd)) => match cmd {
            RemoteCommand::Add { name, url } => app::add_remote(&config, &name, &url)?,
            RemoteCommand::SetUrl { name, url } => app::set_remote_url(&config, &name, &url)?,
            RemoteCommand::Remove { name } => app::remove_remote(&config, &name)?,
        },
        Some(Commands::Clean { yes }) => app::clean(&config, yes)?,
        Some(Commands::Destroy { yes }) => app::destroy(&config, yes)?,
    }

    Ok(())
}
