//! Local execution through the configured shell.

use super::ExecOutput;
use std::process::{Command, Stdio};

/// Execute `command` as `<shell> -c <command>`, blocking until it exits.
/// A process killed by a signal has no exit code and reports `-1`.
pub fn exec_local(shell: &str, command: &str) -> Result<ExecOutput, String> {
    let output = Command::new(shell)
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| format!("failed to spawn {}: {}", shell, e))?;

    Ok(ExecOutput {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}
