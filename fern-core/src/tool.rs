//! Synchronous invocation of external build tools.

use std::io;
use std::path::PathBuf;
use std::process::Command;

/// Captured result of one external tool invocation.
#[derive(Debug)]
pub struct ToolOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Run a command to completion, capturing stdout/stderr as text.
pub fn capture(cmd: &mut Command) -> io::Result<ToolOutput> {
    tracing::debug!("Running {:?}", cmd);
    let output = cmd.output()?;
    Ok(ToolOutput {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Locate a program on `PATH`, mirroring `which`.
pub fn find_program(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}
