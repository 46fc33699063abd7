//! Daemon lifecycle management (stop, status).

use std::time::Duration;

use reconcile_engine::{decode_branch_name, read_main_branch};
use vctrls_config_and_utils::{Config, Paths};

use super::init::Workspace;
use super::pid;

/// Stop the daemon.
pub async fn stop_daemon(paths: &Paths) -> Result<(), Box<dyn std::error::Error>> {
    let pid_path = paths.pid_file();

    let Some(pid) = pid::running_pid(&pid_path) else {
        println!("vctrls is not running");
        // Clean up stale PID file if it exists
        pid::remove_pid(&pid_path);
        return Ok(());
    };

    // SIGTERM lets the engine finish the event it is on.
    unsafe {
        libc::kill(pid, libc::SIGTERM);
    }
    println!("Shutdown requested for PID {}", pid);

    // Wait for daemon to stop (up to 5 seconds)
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if !pid::is_alive(pid) {
            pid::remove_pid(&pid_path);
            println!("vctrls stopped");
            return Ok(());
        }
    }

    println!("vctrls did not stop gracefully, sending SIGKILL to PID {}", pid);
    unsafe {
        libc::kill(pid, libc::SIGKILL);
    }
    pid::remove_pid(&pid_path);
    println!("vctrls killed");

    Ok(())
}

/// Print daemon and shadow repository state.
pub fn check_status(config: &Config, paths: &Paths) -> Result<(), Box<dyn std::error::Error>> {
    match pid::running_pid(&paths.pid_file()) {
        Some(pid) => {
            println!("vctrls is running");
            println!("  PID:     {}", pid);
        }
        None => println!("vctrls is not running"),
    }
    println!("  Log:     {}", paths.log_file().display());

    let ws = match Workspace::resolve(config) {
        Ok(ws) => ws,
        Err(e) => {
            println!("  Watch:   unavailable ({})", e);
            return Ok(());
        }
    };
    println!("  Root:    {}", ws.watch_root.display());
    println!("  HEAD:    {}", ws.head_file.display());
    match read_main_branch(&ws.head_file) {
        Ok(branch) if branch.is_empty() => println!("  Branch:  (detached)"),
        Ok(branch) => println!("  Branch:  {}", branch),
        Err(e) => println!("  Branch:  unknown ({})", e),
    }
    println!("  Shadow:  {}", ws.shadow_path.display());

    match ws.open_shadow() {
        Ok(repo) => {
            let branches = repo.list_branches()?;
            let tracked = branches
                .iter()
                .filter(|b| decode_branch_name(b).is_some())
                .count();
            println!("  Tracked: {} file branches", tracked);
            if let Some(current) = repo.current_branch() {
                println!("  Checked out: {}", current);
            }
        }
        Err(e) => println!("  Tracked: unavailable ({})", e),
    }

    Ok(())
}
