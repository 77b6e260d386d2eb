//! Execution engine: status checks and installation.
//!
//! The only module that spawns processes. Every command runs through the
//! configured shell, one at a time, and is classified by exit code:
//! 0 → installed, 1 → not installed, anything else → error.

use super::data::SystemconfData;
use super::graph::bfs_iterator;
use super::index::TargetRecord;
use super::recipe::{resolve_check, resolve_setup};
use super::types::{Executable, Outcome, TargetStatus};
use crate::transport::{self, ExecOutput};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;

/// Result of checking every target.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusReport {
    pub installed: Vec<String>,
    pub missing: Vec<String>,
    pub errors: Vec<String>,
    /// Outcome of every target that is not installed, in traversal order.
    pub outcomes: IndexMap<String, Outcome>,
}

impl StatusReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.errors.is_empty()
    }
}

/// Result of an install pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InstallReport {
    pub installed: Vec<String>,
    pub failed: Vec<String>,
    pub skipped: Vec<String>,
    pub outcomes: IndexMap<String, Outcome>,
}

impl InstallReport {
    pub fn success(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

fn record<'a>(data: &'a SystemconfData, target: &str) -> Result<&'a TargetRecord, Outcome> {
    data.execution_index
        .get(target)
        .ok_or_else(|| Outcome::error(format!("unknown target '{}'", target)))
}

/// Map a finished process to an outcome. `None` means success.
fn classify(output: ExecOutput) -> Option<Outcome> {
    match output.exit_code {
        0 => None,
        1 => Some(Outcome::not_installed(output.stdout)),
        _ => Some(Outcome::error(output.stderr.trim())),
    }
}

fn run(data: &SystemconfData, command: &str) -> Option<Outcome> {
    match transport::exec(data.shell(), command) {
        Ok(output) => classify(output),
        Err(e) => Some(Outcome::error(e)),
    }
}

/// Resolve the check command for a target.
pub fn check_command(data: &SystemconfData, target: &str) -> Result<String, Outcome> {
    let record = record(data, target)?;
    match record.check_procedure() {
        Some(Executable::Command(cmd)) => Ok(cmd.clone()),
        Some(Executable::Invocation(inv)) => {
            resolve_check(inv, &data.recipe_index).map_err(|e| Outcome::error(e.to_string()))
        }
        None => Err(Outcome::error(format!("target '{}' has no check procedure", target))),
    }
}

/// Resolve the ordered install commands for a target.
pub fn install_commands(data: &SystemconfData, target: &str) -> Result<Vec<String>, Outcome> {
    let record = record(data, target)?;
    let mut commands = Vec::new();
    for executable in record.install_procedure() {
        match executable {
            Executable::Command(cmd) => commands.push(cmd.clone()),
            Executable::Invocation(inv) => commands.extend(
                resolve_setup(inv, &data.recipe_index).map_err(|e| Outcome::error(e.to_string()))?,
            ),
        }
    }
    Ok(commands)
}

/// One-line summary of what installing `target` would run: the first
/// command, followed by `...` when there are more.
pub fn describe_install(data: &SystemconfData, target: &str) -> String {
    match install_commands(data, target) {
        Ok(commands) => match commands.as_slice() {
            [] => String::new(),
            [only] => only.clone(),
            [first, ..] => format!("{} ...", first),
        },
        Err(outcome) => outcome.detail,
    }
}

/// Run the target's check. `None` means installed.
pub fn check_target_status(data: &SystemconfData, target: &str) -> Option<Outcome> {
    match check_command(data, target) {
        Ok(cmd) => run(data, &cmd),
        Err(outcome) => Some(outcome),
    }
}

/// Run the target's install procedure, stopping at the first failing command.
/// `None` means every command succeeded.
pub fn install_target(data: &SystemconfData, target: &str) -> Option<Outcome> {
    let commands = match install_commands(data, target) {
        Ok(commands) => commands,
        Err(outcome) => return Some(outcome),
    };
    for cmd in &commands {
        if let Some(outcome) = run(data, cmd) {
            return Some(outcome);
        }
    }
    None
}

/// Check every target in traversal order.
pub fn status(data: &SystemconfData) -> StatusReport {
    let mut report = StatusReport::default();
    for target in bfs_iterator(&data.graph, None) {
        match check_target_status(data, target) {
            None => report.installed.push(target.to_string()),
            Some(outcome) => {
                match outcome.status {
                    TargetStatus::Error => report.errors.push(target.to_string()),
                    _ => report.missing.push(target.to_string()),
                }
                report.outcomes.insert(target.to_string(), outcome);
            }
        }
    }
    report
}

/// Install every missing target in traversal order.
///
/// A target is skipped when any of its dependencies errored during the
/// status check, failed to install, or was itself skipped.
pub fn install_missing(data: &SystemconfData, status: &StatusReport) -> InstallReport {
    let missing: HashSet<&str> = status.missing.iter().map(String::as_str).collect();
    let mut blocked: HashSet<String> = status.errors.iter().cloned().collect();
    let mut report = InstallReport::default();

    for target in bfs_iterator(&data.graph, None) {
        if !missing.contains(target) {
            continue;
        }

        let failed_deps: Vec<&str> = data
            .dependencies_of(target)
            .iter()
            .filter(|d| blocked.contains(d.as_str()))
            .map(String::as_str)
            .collect();
        if !failed_deps.is_empty() {
            log::warn!("skipping {}: dependency failed: {}", target, failed_deps.join(", "));
            let outcome = Outcome::skipped(format!("dependency failed: {}", failed_deps.join(", ")));
            report.skipped.push(target.to_string());
            report.outcomes.insert(target.to_string(), outcome);
            blocked.insert(target.to_string());
            continue;
        }

        log::info!("installing {}", target);
        match install_target(data, target) {
            None => {
                log::info!("installed {}", target);
                report.installed.push(target.to_string());
            }
            Some(outcome) => {
                log::info!("failed {}: {}", target, outcome.detail.trim());
                report.failed.push(target.to_string());
                report.outcomes.insert(target.to_string(), outcome);
                blocked.insert(target.to_string());
            }
        }
    }
    report
}
