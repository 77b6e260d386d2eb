//! Recipe definitions, argument binding, and template expansion.
//!
//! A recipe declares formal parameters, a check template, and a list of setup
//! executables. Templates reference parameters as `{name}`. `${...}` is left
//! untouched for the shell, and `{{` / `}}` produce literal braces.
//!
//! Setup lists may invoke other recipes. Those invocations are expanded
//! recursively through the recipe index, with the enclosing recipe's bound
//! arguments substituted into the nested invocation's argument values first.

use super::error::RecipeExpansionError;
use super::index::RecipeIndex;
use super::types::{yaml_value_to_string, Executable, RecipeArgs, RecipeDecl, RecipeInvocation};
use indexmap::IndexMap;
use regex::Regex;
use std::sync::LazyLock;

/// Nesting limit for recipe-in-recipe expansion.
pub const MAX_RECIPE_DEPTH: usize = 32;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{|\}\}|\$\{[^}]*\}|\{([A-Za-z_][A-Za-z0-9_]*)\}")
        .expect("placeholder pattern is valid")
});

/// A named, parameterized procedure template.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeDefinition {
    pub name: String,
    pub description: Option<String>,
    pub params: Vec<String>,
    pub defaults: IndexMap<String, String>,
    pub check: Option<String>,
    pub setup: Vec<Executable>,
}

/// Parameter name → bound value, in parameter order.
pub type Bindings = IndexMap<String, String>;

impl RecipeDefinition {
    pub fn from_decl(name: &str, decl: &RecipeDecl) -> Self {
        Self {
            name: name.to_string(),
            description: decl.description.clone(),
            params: decl.params.clone(),
            defaults: decl
                .defaults
                .iter()
                .map(|(k, v)| (k.clone(), yaml_value_to_string(v)))
                .collect(),
            check: decl.check.clone(),
            setup: decl.setup.clone(),
        }
    }

    /// Bind caller arguments to formal parameters, falling back to defaults.
    pub fn bind_arguments(&self, args: &RecipeArgs) -> Result<Bindings, RecipeExpansionError> {
        let mut provided: IndexMap<&str, String> = IndexMap::new();

        match args {
            RecipeArgs::Positional(values) => {
                if values.len() > self.params.len() {
                    return Err(RecipeExpansionError::TooManyArguments {
                        recipe: self.name.clone(),
                        expected: self.params.len(),
                        got: values.len(),
                    });
                }
                for (param, value) in self.params.iter().zip(values) {
                    provided.insert(param.as_str(), yaml_value_to_string(value));
                }
            }
            RecipeArgs::Named(values) => {
                for (key, value) in values {
                    let param = self
                        .params
                        .iter()
                        .find(|p| *p == key)
                        .ok_or_else(|| RecipeExpansionError::UnexpectedArgument {
                            recipe: self.name.clone(),
                            argument: key.clone(),
                        })?;
                    provided.insert(param.as_str(), yaml_value_to_string(value));
                }
            }
        }

        let mut bindings = Bindings::new();
        for param in &self.params {
            let value = match provided.swap_remove(param.as_str()) {
                Some(v) => v,
                None => self.defaults.get(param).cloned().ok_or_else(|| {
                    RecipeExpansionError::MissingArgument {
                        recipe: self.name.clone(),
                        param: param.clone(),
                    }
                })?,
            };
            bindings.insert(param.clone(), value);
        }
        Ok(bindings)
    }

    /// Resolve the check template with the given arguments.
    pub fn get_check_command(&self, args: &RecipeArgs) -> Result<String, RecipeExpansionError> {
        let template = self
            .check
            .as_deref()
            .ok_or_else(|| RecipeExpansionError::MissingCheck(self.name.clone()))?;
        let bindings = self.bind_arguments(args)?;
        substitute(&self.name, template, &bindings)
    }

    /// Resolve the setup templates with the given arguments, expanding nested
    /// recipe invocations through `recipes`.
    pub fn get_setup_commands(
        &self,
        args: &RecipeArgs,
        recipes: &RecipeIndex,
    ) -> Result<Vec<String>, RecipeExpansionError> {
        let bindings = self.bind_arguments(args)?;
        self.expand_setup(&bindings, recipes, 0)
    }

    fn expand_setup(
        &self,
        bindings: &Bindings,
        recipes: &RecipeIndex,
        depth: usize,
    ) -> Result<Vec<String>, RecipeExpansionError> {
        if depth >= MAX_RECIPE_DEPTH {
            return Err(RecipeExpansionError::TooDeep {
                recipe: self.name.clone(),
                limit: MAX_RECIPE_DEPTH,
            });
        }

        let mut commands = Vec::new();
        for executable in &self.setup {
            match executable {
                Executable::Command(template) => {
                    commands.push(substitute(&self.name, template, bindings)?);
                }
                Executable::Invocation(inv) => {
                    let nested = lookup(recipes, &inv.recipe)?;
                    let args = self.substitute_args(&inv.args, bindings)?;
                    let nested_bindings = nested.bind_arguments(&args)?;
                    commands.extend(nested.expand_setup(&nested_bindings, recipes, depth + 1)?);
                }
            }
        }
        Ok(commands)
    }

    /// Substitute this recipe's bindings into string argument values of a
    /// nested invocation.
    fn substitute_args(
        &self,
        args: &RecipeArgs,
        bindings: &Bindings,
    ) -> Result<RecipeArgs, RecipeExpansionError> {
        let render = |value: &serde_yaml_ng::Value| -> Result<serde_yaml_ng::Value, RecipeExpansionError> {
            match value {
                serde_yaml_ng::Value::String(s) => Ok(serde_yaml_ng::Value::String(substitute(
                    &self.name, s, bindings,
                )?)),
                other => Ok(other.clone()),
            }
        };

        Ok(match args {
            RecipeArgs::Positional(values) => RecipeArgs::Positional(
                values.iter().map(render).collect::<Result<_, _>>()?,
            ),
            RecipeArgs::Named(values) => RecipeArgs::Named(
                values
                    .iter()
                    .map(|(k, v)| Ok((k.clone(), render(v)?)))
                    .collect::<Result<_, RecipeExpansionError>>()?,
            ),
        })
    }

    /// Names of recipes invoked from this recipe's setup list.
    pub fn invoked_recipes(&self) -> Vec<String> {
        self.setup
            .iter()
            .filter_map(|e| match e {
                Executable::Invocation(inv) => Some(inv.recipe.clone()),
                Executable::Command(_) => None,
            })
            .collect()
    }
}

fn lookup<'a>(
    recipes: &'a RecipeIndex,
    name: &str,
) -> Result<&'a RecipeDefinition, RecipeExpansionError> {
    recipes
        .get(name)
        .ok_or_else(|| RecipeExpansionError::UnknownRecipe(name.to_string()))
}

/// Resolve an invocation's check command.
pub fn resolve_check(
    inv: &RecipeInvocation,
    recipes: &RecipeIndex,
) -> Result<String, RecipeExpansionError> {
    lookup(recipes, &inv.recipe)?.get_check_command(&inv.args)
}

/// Resolve an invocation's setup commands.
pub fn resolve_setup(
    inv: &RecipeInvocation,
    recipes: &RecipeIndex,
) -> Result<Vec<String>, RecipeExpansionError> {
    lookup(recipes, &inv.recipe)?.get_setup_commands(&inv.args, recipes)
}

/// Replace `{param}` placeholders in `template` with bound values.
pub fn substitute(
    recipe: &str,
    template: &str,
    bindings: &Bindings,
) -> Result<String, RecipeExpansionError> {
    let mut result = String::with_capacity(template.len());
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(template) {
        let Some(whole) = caps.get(0) else { continue };
        result.push_str(&template[last..whole.start()]);
        last = whole.end();

        match whole.as_str() {
            "{{" => result.push('{'),
            "}}" => result.push('}'),
            s if s.starts_with('$') => result.push_str(s),
            _ => {
                let key = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                let value = bindings.get(key).ok_or_else(|| {
                    RecipeExpansionError::UnknownParameter {
                        recipe: recipe.to_string(),
                        placeholder: key.to_string(),
                    }
                })?;
                result.push_str(value);
            }
        }
    }

    result.push_str(&template[last..]);
    Ok(result)
}
