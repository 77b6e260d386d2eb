//! CLI subcommands: validate, list, deps, ls, status, install, completions.

use crate::core::data::SystemconfData;
use crate::core::error::LoadError;
use crate::core::executor::{self, InstallReport, StatusReport};
use crate::core::graph::{bfs_iterator, zero_dependency_targets};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::fmt::Write as _;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

const INDENT: &str = "    ";

#[derive(Parser, Debug)]
#[command(
    name = "systemconf",
    version,
    about = "Install and check programs declared in a single dependency-ordered configuration file"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(
        short,
        long,
        env = "SYSTEMCONF_CONFIG",
        default_value = "systemconf.yaml",
        global = true
    )]
    pub config: PathBuf,

    /// Verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse and validate the configuration without running anything
    Validate,

    /// List targets in dependency order
    List,

    /// Show every target with its dependencies
    Deps,

    /// Walk the graph from the first root target, showing how each is installed
    Ls,

    /// Run every target's check and report what is installed
    Status {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Install every missing target in dependency order
    Install {
        /// Proceed without prompting
        #[arg(short, long)]
        yes: bool,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

/// Dispatch a CLI command.
pub fn dispatch(cli: Cli) -> Result<(), String> {
    let file = cli.config.as_path();
    match cli.command {
        Commands::Validate => cmd_validate(file),
        Commands::List => cmd_list(file),
        Commands::Deps => cmd_deps(file),
        Commands::Ls => cmd_ls(file),
        Commands::Status { json } => cmd_status(file, json),
        Commands::Install { yes } => cmd_install(file, yes),
        Commands::Completions { shell } => {
            write_completions(shell, &mut io::stdout());
            Ok(())
        }
    }
}

fn load(file: &Path) -> Result<SystemconfData, String> {
    SystemconfData::load(file).map_err(|e| e.to_string())
}

fn cmd_validate(file: &Path) -> Result<(), String> {
    match SystemconfData::load(file) {
        Ok(data) => {
            println!(
                "OK: {} ({} targets, {} recipes)",
                data.ast.name,
                data.execution_index.len(),
                data.recipe_index.len()
            );
            Ok(())
        }
        Err(LoadError::Validation(errors)) => {
            for e in errors.iter() {
                eprintln!("  ERROR: {}", e);
            }
            Err(format!("{} validation error(s)", errors.len()))
        }
        Err(e) => Err(e.to_string()),
    }
}

fn cmd_list(file: &Path) -> Result<(), String> {
    let data = load(file)?;
    for target in bfs_iterator(&data.graph, None) {
        println!("{}", target);
    }
    Ok(())
}

fn cmd_deps(file: &Path) -> Result<(), String> {
    let data = load(file)?;
    print!("{}", format_deps(&data));
    Ok(())
}

fn cmd_ls(file: &Path) -> Result<(), String> {
    let data = load(file)?;
    print!("{}", format_ls(&data));
    Ok(())
}

fn cmd_status(file: &Path, json: bool) -> Result<(), String> {
    let data = load(file)?;
    let report = executor::status(&data);
    if json {
        let out = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("cannot serialize status: {}", e))?;
        println!("{}", out);
    } else {
        print!("{}", format_status(&data, &report));
    }
    Ok(())
}

fn cmd_install(file: &Path, yes: bool) -> Result<(), String> {
    let data = load(file)?;
    println!("Checking which targets are already installed...");
    let report = executor::status(&data);
    print!("{}", format_install_plan(&data, &report));

    if report.missing.is_empty() {
        return Ok(());
    }
    if !yes {
        let stdin = io::stdin();
        if !confirm(&mut stdin.lock(), &mut io::stdout()) {
            println!("Exiting");
            return Ok(());
        }
    }

    let result = executor::install_missing(&data, &report);
    print!("{}", format_install_result(&result));
    if result.success() {
        Ok(())
    } else {
        Err(format!(
            "{} target(s) failed, {} skipped",
            result.failed.len(),
            result.skipped.len()
        ))
    }
}

/// Ask `proceed? [y/N]` and read one line. Anything but `y`/`yes` declines,
/// as does any I/O failure on either side of the prompt.
fn confirm(input: &mut impl BufRead, output: &mut impl Write) -> bool {
    if let Err(e) = write!(output, "proceed? [y/N]: ").and_then(|()| output.flush()) {
        log::warn!("cannot write prompt: {}", e);
        return false;
    }
    let mut answer = String::new();
    if let Err(e) = input.read_line(&mut answer) {
        log::warn!("cannot read answer: {}", e);
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn write_completions(shell: Shell, out: &mut impl Write) {
    clap_complete::generate(shell, &mut Cli::command(), "systemconf", out);
}

fn deps_string(data: &SystemconfData, target: &str) -> String {
    let deps = data.dependencies_of(target);
    if deps.is_empty() {
        "-".to_string()
    } else {
        deps.join(", ")
    }
}

/// Collapse multi-line process output onto one line.
fn one_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn format_deps(data: &SystemconfData) -> String {
    let rows: Vec<(&str, String)> = bfs_iterator(&data.graph, None)
        .map(|t| (t, deps_string(data, t)))
        .collect();
    let width = rows
        .iter()
        .map(|(t, _)| t.len())
        .chain(std::iter::once("target".len()))
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    let _ = writeln!(out, "{:<width$}  dependencies", "target");
    for (target, deps) in &rows {
        let _ = writeln!(out, "{:<width$}  {}", target, deps);
    }
    out
}

fn format_ls(data: &SystemconfData) -> String {
    let mut out = String::new();
    let Some(root) = zero_dependency_targets(&data.dependency_index).first().copied() else {
        return out;
    };
    for target in bfs_iterator(&data.graph, Some(root)) {
        let _ = writeln!(out, "{}", target);
        let _ = writeln!(out, "  ↳ Dependencies: {}", deps_string(data, target));
        if let Some(record) = data.execution_index.get(target) {
            for executable in &record.setup {
                let _ = writeln!(out, "  ↳ Setup: {}", executable);
            }
            for executable in &record.recipe {
                let _ = writeln!(out, "  ↳ Recipe: {}", executable);
            }
            if let Some(check) = &record.check {
                let _ = writeln!(out, "  ↳ Check: {}", check);
            }
        }
    }
    out
}

fn format_status(data: &SystemconfData, report: &StatusReport) -> String {
    let targets: Vec<&str> = bfs_iterator(&data.graph, None).collect();
    let target_width = targets.iter().map(|t| t.len()).max().unwrap_or(0).max(6);
    let deps_width = targets
        .iter()
        .map(|t| deps_string(data, t).len())
        .max()
        .unwrap_or(0)
        .max(12);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<tw$}  {:<dw$}  {:<13}  details",
        "target",
        "dependencies",
        "status",
        tw = target_width,
        dw = deps_width
    );
    for target in targets {
        let (status, detail) = match report.outcomes.get(target) {
            Some(outcome) => (outcome.status.to_string(), one_line(&outcome.detail)),
            None => ("INSTALLED".to_string(), String::new()),
        };
        let _ = writeln!(
            out,
            "{:<tw$}  {:<dw$}  {:<13}  {}",
            target,
            deps_string(data, target),
            status,
            detail,
            tw = target_width,
            dw = deps_width
        );
    }
    let _ = writeln!(
        out,
        "\n{} installed, {} missing, {} error(s)",
        report.installed.len(),
        report.missing.len(),
        report.errors.len()
    );
    out
}

fn format_install_plan(data: &SystemconfData, report: &StatusReport) -> String {
    let mut out = String::new();
    if data.execution_index.is_empty() {
        let _ = writeln!(out, "No targets found. Nothing to do.");
        return out;
    }

    if !report.installed.is_empty() {
        let _ = writeln!(out, "These are already installed:");
        for target in &report.installed {
            let _ = writeln!(out, "{}{}", INDENT, target);
        }
    }
    if !report.errors.is_empty() {
        let _ = writeln!(out, "\nThese encountered errors and will not be installed:");
        for target in &report.errors {
            let _ = writeln!(out, "{}{}", INDENT, target);
            if let Some(outcome) = report.outcomes.get(target) {
                let _ = writeln!(out, "{}{}⤷ {}", INDENT, INDENT, one_line(&outcome.detail));
            }
        }
    }
    if report.missing.is_empty() {
        let _ = writeln!(out, "\nEverything that can be installed is already installed");
        return out;
    }

    let _ = writeln!(out, "\nThese will be installed with the following commands:");
    for target in &report.missing {
        let _ = writeln!(out, "{}{}", INDENT, target);
        let _ = writeln!(
            out,
            "{}{}⤷ {}",
            INDENT,
            INDENT,
            executor::describe_install(data, target)
        );
    }
    out
}

fn format_install_result(report: &InstallReport) -> String {
    let mut out = String::new();
    if report.installed.is_empty() && report.failed.is_empty() && report.skipped.is_empty() {
        let _ = writeln!(out, "Nothing was done.");
        return out;
    }
    if !report.installed.is_empty() {
        let _ = writeln!(out, "\nInstalled successfully:");
        for target in &report.installed {
            let _ = writeln!(out, "{}{}", INDENT, target);
        }
    }
    for (heading, targets) in [
        ("Failed to install:", &report.failed),
        ("Skipped:", &report.skipped),
    ] {
        if targets.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n{}", heading);
        for target in targets {
            let _ = writeln!(out, "{}{}", INDENT, target);
            if let Some(outcome) = report.outcomes.get(target) {
                let _ = writeln!(
                    out,
                    "{}{}{}: {}",
                    INDENT,
                    INDENT,
                    outcome.status,
                    one_line(&outcome.detail)
                );
            }
        }
    }
    out
}
