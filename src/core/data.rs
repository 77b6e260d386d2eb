//! SystemconfData: the immutable aggregate every operation reads from.
//!
//! Built once per run: parse → indices → graph → validate. Nothing mutates
//! it afterwards; operations take it by shared reference.

use super::error::{LoadError, ValidationErrors};
use super::graph::DependencyGraph;
use super::index::{
    get_dependencies, get_executable_index, get_recipe_definition_index, DependencyIndex,
    ExecutionIndex, RecipeIndex,
};
use super::parser;
use super::types::SystemconfFile;
use super::validator;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct SystemconfData {
    pub ast: SystemconfFile,
    pub execution_index: ExecutionIndex,
    pub recipe_index: RecipeIndex,
    pub dependency_index: DependencyIndex,
    pub graph: DependencyGraph,
}

impl SystemconfData {
    /// Derive indices and graph from a parsed configuration without validating.
    pub fn from_ast(ast: SystemconfFile) -> Self {
        let execution_index = get_executable_index(&ast);
        let dependency_index = get_dependencies(&ast, &execution_index);
        let graph = DependencyGraph::build(&dependency_index);
        let recipe_index = get_recipe_definition_index(&ast);
        log::debug!(
            "indexed {} targets, {} recipes",
            execution_index.len(),
            recipe_index.len()
        );
        Self {
            ast,
            execution_index,
            recipe_index,
            dependency_index,
            graph,
        }
    }

    /// Build and validate. Any validation failure rejects the whole configuration.
    pub fn build(ast: SystemconfFile) -> Result<Self, ValidationErrors> {
        let data = Self::from_ast(ast);
        validator::validate(&data)?;
        Ok(data)
    }

    /// Parse, build, and validate a configuration string.
    pub fn from_source(source: &str) -> Result<Self, LoadError> {
        Ok(Self::build(parser::parse(source)?)?)
    }

    /// Parse, build, and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        Ok(Self::build(parser::parse_file(path)?)?)
    }

    /// Shell used to run every command.
    pub fn shell(&self) -> &str {
        &self.ast.shell
    }

    /// Declared dependencies of `target`.
    pub fn dependencies_of(&self, target: &str) -> &[String] {
        self.dependency_index
            .get(target)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
