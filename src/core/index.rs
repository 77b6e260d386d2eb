//! Index construction: execution, recipe, and dependency lookups derived
//! from the configuration.
//!
//! Builders never fail. Dangling references and empty procedures are carried
//! through untouched so the validator can report all of them together.

use super::recipe::RecipeDefinition;
use super::types::{Executable, SystemconfFile};
use indexmap::IndexMap;

/// Procedure lists for one target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetRecord {
    pub setup: Vec<Executable>,
    pub recipe: Vec<Executable>,
    pub check: Option<Executable>,
}

impl TargetRecord {
    /// Executables run to install the target: `setup` if present, else `recipe`.
    pub fn install_procedure(&self) -> &[Executable] {
        if self.setup.is_empty() {
            &self.recipe
        } else {
            &self.setup
        }
    }

    /// The executable whose exit code classifies the target.
    ///
    /// Explicit `check` first, then the head of `recipe`, then the head of
    /// `setup` when it is a recipe invocation. Raw setup commands are never
    /// used as checks.
    pub fn check_procedure(&self) -> Option<&Executable> {
        if let Some(ref check) = self.check {
            return Some(check);
        }
        if let Some(first) = self.recipe.first() {
            return Some(first);
        }
        match self.setup.first() {
            Some(inv @ Executable::Invocation(_)) => Some(inv),
            _ => None,
        }
    }

    /// All executables the target references, in declaration order.
    pub fn executables(&self) -> impl Iterator<Item = &Executable> {
        self.check.iter().chain(self.setup.iter()).chain(self.recipe.iter())
    }
}

/// Target name → procedure.
pub type ExecutionIndex = IndexMap<String, TargetRecord>;

/// Recipe name → definition.
pub type RecipeIndex = IndexMap<String, RecipeDefinition>;

/// Target name → names it depends on.
pub type DependencyIndex = IndexMap<String, Vec<String>>;

/// One record per declared target.
pub fn get_executable_index(ast: &SystemconfFile) -> ExecutionIndex {
    ast.targets
        .iter()
        .map(|(name, decl)| {
            (
                name.clone(),
                TargetRecord {
                    setup: decl.setup.clone(),
                    recipe: decl.recipe.clone(),
                    check: decl.check.clone(),
                },
            )
        })
        .collect()
}

/// One definition per declared recipe.
pub fn get_recipe_definition_index(ast: &SystemconfFile) -> RecipeIndex {
    ast.recipes
        .iter()
        .map(|(name, decl)| (name.clone(), RecipeDefinition::from_decl(name, decl)))
        .collect()
}

/// One entry per indexed target, even when it has no dependencies.
/// Repeated dependency names are collapsed, first occurrence wins.
pub fn get_dependencies(ast: &SystemconfFile, executables: &ExecutionIndex) -> DependencyIndex {
    executables
        .keys()
        .map(|name| {
            let mut deps: Vec<String> = Vec::new();
            if let Some(decl) = ast.targets.get(name) {
                for dep in &decl.depends_on {
                    if !deps.contains(dep) {
                        deps.push(dep.clone());
                    }
                }
            }
            (name.clone(), deps)
        })
        .collect()
}
