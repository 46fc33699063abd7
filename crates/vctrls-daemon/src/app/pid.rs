//! PID file handling.

use std::io;
use std::path::Path;

/// PID recorded in `path`, if the file holds one.
pub fn read_pid(path: &Path) -> Option<i32> {
    std::fs::read_to_string(path).ok()?.trim().parse().ok()
}

/// Whether a process with `pid` exists.
pub fn is_alive(pid: i32) -> bool {
    // 0 and negatives address process groups.
    if pid <= 0 {
        return false;
    }
    let rc = unsafe { libc::kill(pid, 0) };
    rc == 0 || io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

/// PID of a live daemon recorded in `path`.
pub fn running_pid(path: &Path) -> Option<i32> {
    read_pid(path).filter(|pid| is_alive(*pid))
}

pub fn write_pid(path: &Path) -> io::Result<u32> {
    let pid = std::process::id();
    std::fs::write(path, pid.to_string())?;
    Ok(pid)
}

pub fn remove_pid(path: &Path) {
    let _ = std::fs::remove_file(path);
}
