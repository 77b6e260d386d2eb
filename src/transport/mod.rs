//! Process transport: run a shell command and capture its outcome.

pub mod local;

/// Output from executing a command.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Run `command` through `shell` on this machine.
pub fn exec(shell: &str, command: &str) -> Result<ExecOutput, String> {
    log::debug!("exec [{}]: {}", shell, command);
    let out = local::exec_local(shell, command)?;
    log::debug!("exit {} ({} bytes stdout)", out.exit_code, out.stdout.len());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_exec_output_success() {
        let ok = ExecOutput { exit_code: 0, stdout: "ok".into(), stderr: "".into() };
        assert!(ok.success());
        let fail = ExecOutput { exit_code: 1, stdout: "".into(), stderr: "err".into() };
        assert!(!fail.success());
        let sig = ExecOutput { exit_code: 137, stdout: "".into(), stderr: "killed".into() };
        assert!(!sig.success());
    }

    #[test]
    fn test_transport_exec_delegates() {
        let out = exec("sh", "echo exec-test").unwrap();
        assert!(out.success());
        assert_eq!(out.stdout.trim(), "exec-test");
    }

    #[test]
    fn test_transport_unknown_shell() {
        let result = exec("/nonexistent/shell-binary", "true");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("failed to spawn"));
    }
}
