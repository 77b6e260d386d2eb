//! Error taxonomy: parse, validation, and recipe expansion failures.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The configuration could not be read or decoded.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

/// A single structural problem in a parsed configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("version must be \"1.0\", got \"{0}\"")]
    UnsupportedVersion(String),

    #[error("name must not be empty")]
    EmptyName,

    #[error("target '{target}' depends on unknown target '{dependency}'")]
    UnknownDependency { target: String, dependency: String },

    #[error("{owner} invokes unknown recipe '{recipe}'")]
    UnknownRecipe { owner: String, recipe: String },

    #[error("dependency cycle detected: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),

    #[error("recipe cycle detected: {}", .0.join(" -> "))]
    RecipeCycle(Vec<String>),

    #[error("no target without dependencies; nothing to start from")]
    NoRootTarget,

    #[error("target '{0}' has neither setup nor recipe commands")]
    EmptyProcedure(String),

    #[error("target '{0}' only has raw setup commands and needs an explicit check")]
    NoCheckCommand(String),

    #[error("recipe '{recipe}' has no check command but is used to check target '{target}'")]
    RecipeWithoutCheck { recipe: String, target: String },
}

/// Every violation found by one validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation error(s)", self.0.len())?;
        for e in &self.0 {
            write!(f, "\n  {}", e)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Recipe resolution failed for one invocation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecipeExpansionError {
    #[error("unknown recipe '{0}'")]
    UnknownRecipe(String),

    #[error("recipe '{recipe}' takes {expected} argument(s), got {got}")]
    TooManyArguments {
        recipe: String,
        expected: usize,
        got: usize,
    },

    #[error("recipe '{recipe}' has no parameter '{argument}'")]
    UnexpectedArgument { recipe: String, argument: String },

    #[error("recipe '{recipe}' requires argument '{param}'")]
    MissingArgument { recipe: String, param: String },

    #[error(
        "recipe '{recipe}' references unknown parameter '{{{placeholder}}}' \
         (write '{{{{{placeholder}}}}}' for literal braces)"
    )]
    UnknownParameter { recipe: String, placeholder: String },

    #[error("recipe '{0}' has no check command")]
    MissingCheck(String),

    #[error("recipe nesting deeper than {limit} at '{recipe}'")]
    TooDeep { recipe: String, limit: usize },
}

/// Failure to produce a validated [`SystemconfData`](super::data::SystemconfData).
#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}
