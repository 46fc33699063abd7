//! Application wiring and lifecycle management.

mod commands;
mod init;
mod lifecycle;
mod pid;

pub use commands::{
    add_remote, clean, destroy, diff, init_shadow, list_branches, push, remove_remote,
    set_remote_url, tree,
};
pub use init::{run_daemon, WatchArgs};
pub use lifecycle::{check_status, stop_daemon};
