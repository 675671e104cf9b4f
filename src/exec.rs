// src/exec.rs

//! Helpers for spawning collaborator processes.
//!
//! Every external tool (bundler, proxy, linter) is run through the platform
//! shell so config commands can use pipes, quoting, and npx scripts as-is.

use tokio::process::Command;

/// Build a shell command appropriate for the platform.
pub fn shell_command(cmd: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    }
}
