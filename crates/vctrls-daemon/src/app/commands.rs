//! One-shot operator commands.

use std::path::{Path, PathBuf};

use hardlink_replicator::{build_tree, clean_working_tree, diff_dirs};
use ignore_list::IgnoreMatcher;
use reconcile_engine::decode_branch_name;
use shadow_git::{init_repository, remove_directory};
use tracing::info;
use vctrls_config_and_utils::{Config, Paths};

use super::init::{WatchArgs, Workspace};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

fn require_confirmation(yes: bool, action: &str) -> CmdResult {
    if yes {
        Ok(())
    } else {
        Err(format!("Refusing to {} without --yes", action).into())
    }
}

/// Create the shadow repository; save the effective config on first run.
pub fn init_shadow(mut config: Config, paths: &Paths, args: WatchArgs) -> CmdResult {
    args.apply(&mut config);
    let ws = Workspace::resolve(&config)?;

    if init_repository(&ws.shadow_path, &ws.identity)? {
        println!("Initialized shadow repository at {}", ws.shadow_path.display());
    } else {
        println!("Shadow repository already exists at {}", ws.shadow_path.display());
    }

    if !paths.config_file().exists() {
        config.save(paths)?;
        println!("Wrote {}", paths.config_file().display());
    }
    Ok(())
}

/// Print every tracked file with the primary branch it was recorded under.
pub fn list_branches(config: &Config) -> CmdResult {
    let repo = Workspace::resolve(config)?.open_shadow()?;

    for name in repo.list_branches()? {
        match decode_branch_name(&name) {
            Some((main, path)) => println!("{:<20} {}  ({})", main, path.display(), name),
            None if name == repo.identity().base_branch => {}
            None => println!("{:<20} {}", "?", name),
        }
    }
    Ok(())
}

pub fn diff(config: &Config, a: &Path, b: &Path) -> CmdResult {
    let matcher = load_matcher(config)?;
    let diff = diff_dirs(a, b, &matcher)?;
    println!("{}", serde_json::to_string_pretty(&diff)?);
    Ok(())
}

pub fn tree(config: &Config, path: Option<PathBuf>) -> CmdResult {
    let root = match path {
        Some(path) => path,
        None => config.resolved_watch_root()?,
    };
    let matcher = load_matcher(config)?;
    let tree = build_tree(&root, &matcher)?;
    println!("{}", serde_json::to_string_pretty(&tree)?);
    Ok(())
}

fn load_matcher(config: &Config) -> Result<IgnoreMatcher, Box<dyn std::error::Error>> {
    let root = config.resolved_watch_root()?;
    let patterns = config.resolved_ignore_patterns_file()?;
    Ok(IgnoreMatcher::load(&root, Some(&patterns)))
}

pub fn push(config: &Config, remote: Option<String>) -> CmdResult {
    let remote = remote.unwrap_or_else(|| config.remote_name.clone());
    let repo = Workspace::resolve(config)?.open_shadow()?;

    let result = repo.push(&remote)?;
    if result.updated {
        println!("Pushed all branches to {}", result.remote);
    } else {
        println!("{} is up to date", result.remote);
    }
    Ok(())
}

pub fn add_remote(config: &Config, name: &str, url: &str) -> CmdResult {
    Workspace::resolve(config)?.open_shadow()?.add_remote(name, url)?;
    println!("Added remote {} -> {}", name, url);
    Ok(())
}

pub fn set_remote_url(config: &Config, name: &str, url: &str) -> CmdResult {
    Workspace::resolve(config)?
        .open_shadow()?
        .update_remote(name, url)?;
    println!("Remote {} -> {}", name, url);
    Ok(())
}

pub fn remove_remote(config: &Config, name: &str) -> CmdResult {
    Workspace::resolve(config)?.open_shadow()?.remove_remote(name)?;
    println!("Removed remote {}", name);
    Ok(())
}

/// Empty the shadow working copy. History and refs stay.
pub fn clean(config: &Config, yes: bool) -> CmdResult {
    require_confirmation(yes, "clean the shadow working copy")?;
    let repo = Workspace::resolve(config)?.open_shadow()?;

    let removed = clean_working_tree(repo.workdir())?;
    info!(removed, path = %repo.workdir().display(), "cleaned shadow working copy");
    println!("Removed {} entries from {}", removed, repo.workdir().display());
    Ok(())
}

pub fn destroy(config: &Config, yes: bool) -> CmdResult {
    require_confirmation(yes, "delete the shadow repository")?;
    let ws = Workspace::resolve(config)?;

    remove_directory(&ws.shadow_path)?;
    info!(path = %ws.shadow_path.display(), "removed shadow repository");
    println!("Deleted {}", ws.shadow_path.display());
    Ok(())
}
