//! Configuration model: the AST decoded from systemconf.yaml, plus the
//! per-target outcome types produced by the engine.
//!
//! All declaration types derive Serialize/Deserialize so a configuration can
//! be round-tripped through YAML. Declaration order is preserved everywhere.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Top-level systemconf.yaml
// ============================================================================

/// Root configuration: the targets a machine should have installed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SystemconfFile {
    /// Schema version (must be "1.0")
    pub version: String,

    /// Human-readable configuration name
    pub name: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Program used to run commands as `<shell> -c <command>`
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Reusable, parameterized procedures (order-preserving)
    #[serde(default)]
    pub recipes: IndexMap<String, RecipeDecl>,

    /// Installable units (order-preserving)
    #[serde(default)]
    pub targets: IndexMap<String, TargetDecl>,
}

fn default_shell() -> String {
    "sh".to_string()
}

// ============================================================================
// Targets
// ============================================================================

/// A target declaration as written in the configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetDecl {
    /// Targets that must be installed first
    #[serde(default)]
    pub depends_on: Vec<String>,

    /// Commands that perform installation, when distinct from `recipe`
    #[serde(default)]
    pub setup: Vec<Executable>,

    /// Executables used to check status and, without `setup`, to install
    #[serde(default)]
    pub recipe: Vec<Executable>,

    /// Explicit status check
    #[serde(default)]
    pub check: Option<Executable>,
}

// ============================================================================
// Recipes
// ============================================================================

/// A recipe declaration: formal parameters plus check/setup templates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecipeDecl {
    #[serde(default)]
    pub description: Option<String>,

    /// Formal parameters, in positional order
    #[serde(default)]
    pub params: Vec<String>,

    /// Values used for parameters the caller leaves out
    #[serde(default)]
    pub defaults: IndexMap<String, serde_yaml_ng::Value>,

    /// Status check template
    #[serde(default)]
    pub check: Option<String>,

    /// Installation templates; may invoke other recipes
    #[serde(default)]
    pub setup: Vec<Executable>,
}

// ============================================================================
// Executables
// ============================================================================

/// One unit of procedure: a raw shell command or a recipe invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Executable {
    Command(String),
    Invocation(RecipeInvocation),
}

impl fmt::Display for Executable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command(cmd) => write!(f, "{}", cmd),
            Self::Invocation(inv) => write!(f, "{}", inv),
        }
    }
}

/// A call to a named recipe with arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecipeInvocation {
    pub recipe: String,

    #[serde(default)]
    pub args: RecipeArgs,
}

impl fmt::Display for RecipeInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.recipe, self.args)
    }
}

/// Invocation arguments: positional list or keyed map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecipeArgs {
    Positional(Vec<serde_yaml_ng::Value>),
    Named(IndexMap<String, serde_yaml_ng::Value>),
}

impl Default for RecipeArgs {
    fn default() -> Self {
        Self::Positional(Vec::new())
    }
}

impl RecipeArgs {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Positional(v) => v.is_empty(),
            Self::Named(m) => m.is_empty(),
        }
    }
}

impl fmt::Display for RecipeArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = match self {
            Self::Positional(values) => values.iter().map(yaml_value_to_string).collect(),
            Self::Named(values) => values
                .iter()
                .map(|(k, v)| format!("{}={}", k, yaml_value_to_string(v)))
                .collect(),
        };
        write!(f, "{}", rendered.join(", "))
    }
}

// ============================================================================
// Outcomes
// ============================================================================

/// Why a target did not end up installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetStatus {
    /// Check or setup exited 1
    NotInstalled,
    /// Any other exit code, a spawn failure, or a recipe expansion failure
    Error,
    /// Not attempted because a dependency failed or is still missing
    Skipped,
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInstalled => write!(f, "NOT INSTALLED"),
            Self::Error => write!(f, "ERROR"),
            Self::Skipped => write!(f, "SKIPPED"),
        }
    }
}

/// Classification plus human-readable detail. Installed targets have no outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub status: TargetStatus,
    pub detail: String,
}

impl Outcome {
    pub fn not_installed(detail: impl Into<String>) -> Self {
        Self {
            status: TargetStatus::NotInstalled,
            detail: detail.into(),
        }
    }

    pub fn error(detail: impl Into<String>) -> Self {
        Self {
            status: TargetStatus::Error,
            detail: detail.into(),
        }
    }

    pub fn skipped(detail: impl Into<String>) -> Self {
        Self {
            status: TargetStatus::Skipped,
            detail: detail.into(),
        }
    }
}

// ============================================================================
// Template helper
// ============================================================================

/// Convert a serde_yaml_ng::Value to a string for template substitution.
pub fn yaml_value_to_string(val: &serde_yaml_ng::Value) -> String {
    match val {
        serde_yaml_ng::Value::String(s) => s.clone(),
        serde_yaml_ng::Value::Number(n) => n.to_string(),
        serde_yaml_ng::Value::Bool(b) => b.to_string(),
        serde_yaml_ng::Value::Null => String::new(),
        other => format!("{:?}", other),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_parse() {
        let yaml = r#"
version: "1.0"
name: workstation
recipes:
  apt:
    params: [package]
    check: "dpkg -s {package}"
    setup:
      - "sudo apt-get install -y {package}"
targets:
  git:
    recipe:
      - recipe: apt
        args: [git]
  dotfiles:
    depends_on: [git]
    check: "test -d ~/.dotfiles"
    setup:
      - "git clone repo ~/.dotfiles"
"#;
        let config: SystemconfFile = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.shell, "sh");
        assert_eq!(config.recipes.len(), 1);
        assert_eq!(config.targets.len(), 2);
        assert_eq!(config.targets["dotfiles"].depends_on, vec!["git"]);
        assert_eq!(
            config.targets["dotfiles"].check,
            Some(Executable::Command("test -d ~/.dotfiles".to_string()))
        );
    }

    #[test]
    fn test_executable_untagged() {
        let raw: Executable = serde_yaml_ng::from_str(r#""echo hi""#).unwrap();
        assert_eq!(raw, Executable::Command("echo hi".to_string()));

        let inv: Executable = serde_yaml_ng::from_str("{recipe: apt, args: [curl]}").unwrap();
        match inv {
            Executable::Invocation(ref i) => {
                assert_eq!(i.recipe, "apt");
                assert_eq!(
                    i.args,
                    RecipeArgs::Positional(vec![serde_yaml_ng::Value::String("curl".into())])
                );
            }
            other => panic!("expected invocation, got {:?}", other),
        }
    }

    #[test]
    fn test_named_args() {
        let inv: RecipeInvocation =
            serde_yaml_ng::from_str("{recipe: node, args: {version: 18}}").unwrap();
        match inv.args {
            RecipeArgs::Named(ref m) => assert_eq!(yaml_value_to_string(&m["version"]), "18"),
            ref other => panic!("expected named args, got {:?}", other),
        }
        assert_eq!(inv.to_string(), "node(version=18)");
    }

    #[test]
    fn test_invocation_without_args() {
        let inv: RecipeInvocation = serde_yaml_ng::from_str("{recipe: nvm}").unwrap();
        assert!(inv.args.is_empty());
        assert_eq!(inv.to_string(), "nvm()");
    }

    #[test]
    fn test_custom_shell() {
        let yaml = r#"
version: "1.0"
name: t
shell: bash
"#;
        let config: SystemconfFile = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.shell, "bash");
        assert!(config.targets.is_empty());
    }

    #[test]
    fn test_target_status_display() {
        assert_eq!(TargetStatus::NotInstalled.to_string(), "NOT INSTALLED");
        assert_eq!(TargetStatus::Error.to_string(), "ERROR");
        assert_eq!(TargetStatus::Skipped.to_string(), "SKIPPED");
    }

    #[test]
    fn test_outcome_serde() {
        let o = Outcome::not_installed("missing");
        let json = serde_json::to_string(&o).unwrap();
        assert!(json.contains("\"status\":\"not_installed\""));
        assert!(json.contains("\"detail\":\"missing\""));
    }

    #[test]
    fn test_yaml_value_to_string() {
        assert_eq!(
            yaml_value_to_string(&serde_yaml_ng::Value::String("hello".into())),
            "hello"
        );
        assert_eq!(yaml_value_to_string(&serde_yaml_ng::Value::Bool(true)), "true");
        assert_eq!(yaml_value_to_string(&serde_yaml_ng::Value::Null), "");
    }
}
