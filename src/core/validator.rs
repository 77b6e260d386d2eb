//! Structural validation of indices and graph.
//!
//! Runs once after construction and collects every violation before failing:
//! - version must be "1.0", name non-empty
//! - dependencies must name declared targets
//! - recipe invocations must name declared recipes (targets and recipes)
//! - no dependency cycles, no recipe invocation cycles
//! - at least one target without dependencies
//! - every target has setup or recipe commands and a resolvable check

use super::data::SystemconfData;
use super::error::{ValidationError, ValidationErrors};
use super::graph::{find_cycle, find_cycle_in, zero_dependency_targets};
use super::types::Executable;
use indexmap::IndexMap;

/// Validate a built configuration. Returns all violations found.
pub fn validate(data: &SystemconfData) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();

    check_header(data, &mut errors);
    check_dependencies(data, &mut errors);
    check_recipe_references(data, &mut errors);

    if let Some(cycle) = find_cycle(&data.graph) {
        errors.push(ValidationError::DependencyCycle(cycle));
    }
    if let Some(cycle) = find_recipe_cycle(data) {
        errors.push(ValidationError::RecipeCycle(cycle));
    }
    if zero_dependency_targets(&data.dependency_index).is_empty() {
        errors.push(ValidationError::NoRootTarget);
    }

    check_procedures(data, &mut errors);

    if errors.is_empty() {
        log::debug!(
            "validated {} ({} targets, {} recipes)",
            data.ast.name,
            data.execution_index.len(),
            data.recipe_index.len()
        );
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}

fn check_header(data: &SystemconfData, errors: &mut Vec<ValidationError>) {
    if data.ast.version != "1.0" {
        errors.push(ValidationError::UnsupportedVersion(data.ast.version.clone()));
    }
    if data.ast.name.is_empty() {
        errors.push(ValidationError::EmptyName);
    }
}

fn check_dependencies(data: &SystemconfData, errors: &mut Vec<ValidationError>) {
    for (target, deps) in &data.dependency_index {
        for dep in deps {
            if !data.execution_index.contains_key(dep) {
                errors.push(ValidationError::UnknownDependency {
                    target: target.clone(),
                    dependency: dep.clone(),
                });
            }
        }
    }
}

fn check_recipe_references(data: &SystemconfData, errors: &mut Vec<ValidationError>) {
    let mut report = |owner: String, recipe: &str| {
        if data.recipe_index.contains_key(recipe) {
            return;
        }
        let error = ValidationError::UnknownRecipe {
            owner,
            recipe: recipe.to_string(),
        };
        if !errors.contains(&error) {
            errors.push(error);
        }
    };

    for (target, record) in &data.execution_index {
        for executable in record.executables() {
            if let Executable::Invocation(inv) = executable {
                report(format!("target '{}'", target), &inv.recipe);
            }
        }
    }
    for (name, recipe) in &data.recipe_index {
        for invoked in recipe.invoked_recipes() {
            report(format!("recipe '{}'", name), &invoked);
        }
    }
}

/// Recipe → recipes its setup invokes, restricted to declared recipes.
fn find_recipe_cycle(data: &SystemconfData) -> Option<Vec<String>> {
    let edges: IndexMap<&str, Vec<String>> = data
        .recipe_index
        .iter()
        .map(|(name, recipe)| {
            let invoked = recipe
                .invoked_recipes()
                .into_iter()
                .filter(|r| data.recipe_index.contains_key(r))
                .collect();
            (name.as_str(), invoked)
        })
        .collect();
    find_cycle_in(edges.keys().copied(), |n| {
        edges.get(n).map(Vec::as_slice).unwrap_or(&[])
    })
}

fn check_procedures(data: &SystemconfData, errors: &mut Vec<ValidationError>) {
    for (target, record) in &data.execution_index {
        if record.setup.is_empty() && record.recipe.is_empty() {
            errors.push(ValidationError::EmptyProcedure(target.clone()));
            continue;
        }
        match record.check_procedure() {
            None => errors.push(ValidationError::NoCheckCommand(target.clone())),
            Some(Executable::Invocation(inv)) => {
                if let Some(recipe) = data.recipe_index.get(&inv.recipe) {
                    if recipe.check.is_none() {
                        errors.push(ValidationError::RecipeWithoutCheck {
                            recipe: inv.recipe.clone(),
                            target: target.clone(),
                        });
                    }
                }
            }
            Some(Executable::Command(_)) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parser::parse;

    fn validate_yaml(yaml: &str) -> Vec<ValidationError> {
        let data = SystemconfData::from_ast(parse(yaml).unwrap());
        match validate(&data) {
            Ok(()) => Vec::new(),
            Err(errors) => errors.0,
        }
    }

    #[test]
    fn test_valid_config() {
        let errors = validate_yaml(
            r#"
version: "1.0"
name: ok
recipes:
  apt:
    params: [package]
    check: "dpkg -s {package}"
    setup: ["apt-get install -y {package}"]
targets:
  a:
    recipe: ["exit 0"]
  b:
    depends_on: [a]
    recipe:
      - recipe: apt
        args: [git]
  c:
    depends_on: [b]
    check: "test -f /tmp/c"
    setup: ["touch /tmp/c"]
"#,
        );
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    }

    #[test]
    fn test_bad_version_and_name() {
        let errors = validate_yaml(
            r#"
version: "2.0"
name: ""
targets:
  a:
    recipe: ["true"]
"#,
        );
        assert!(errors.contains(&ValidationError::UnsupportedVersion("2.0".to_string())));
        assert!(errors.contains(&ValidationError::EmptyName));
    }

    #[test]
    fn test_unknown_dependency() {
        let errors = validate_yaml(
            r#"
version: "1.0"
name: t
targets:
  a:
    recipe: ["true"]
  b:
    depends_on: [ghost]
    recipe: ["true"]
"#,
        );
        assert_eq!(
            errors,
            vec![ValidationError::UnknownDependency {
                target: "b".to_string(),
                dependency: "ghost".to_string(),
            }]
        );
    }

    #[test]
    fn test_unknown_recipe_in_target_and_recipe() {
        let errors = validate_yaml(
            r#"
version: "1.0"
name: t
recipes:
  wrapper:
    check: "true"
    setup:
      - recipe: missing_inner
targets:
  a:
    recipe:
      - recipe: missing
  b:
    recipe:
      - recipe: wrapper
"#,
        );
        assert!(errors.contains(&ValidationError::UnknownRecipe {
            owner: "target 'a'".to_string(),
            recipe: "missing".to_string(),
        }));
        assert!(errors.contains(&ValidationError::UnknownRecipe {
            owner: "recipe 'wrapper'".to_string(),
            recipe: "missing_inner".to_string(),
        }));
    }

    #[test]
    fn test_unknown_recipe_reported_once_per_owner() {
        let errors = validate_yaml(
            r#"
version: "1.0"
name: t
targets:
  a:
    recipe:
      - recipe: missing
      - recipe: missing
"#,
        );
        let count = errors
            .iter()
            .filter(|e| matches!(e, ValidationError::UnknownRecipe { .. }))
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_direct_cycle() {
        let errors = validate_yaml(
            r#"
version: "1.0"
name: t
targets:
  root:
    recipe: ["true"]
  a:
    depends_on: [b]
    recipe: ["true"]
  b:
    depends_on: [a]
    recipe: ["true"]
"#,
        );
        assert_eq!(
            errors,
            vec![ValidationError::DependencyCycle(vec![
                "a".to_string(),
                "b".to_string(),
                "a".to_string()
            ])]
        );
    }

    #[test]
    fn test_indirect_cycle() {
        let errors = validate_yaml(
            r#"
version: "1.0"
name: t
targets:
  root:
    recipe: ["true"]
  a:
    depends_on: [root, c]
    recipe: ["true"]
  b:
    depends_on: [a]
    recipe: ["true"]
  c:
    depends_on: [b]
    recipe: ["true"]
"#,
        );
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::DependencyCycle(path) if path.len() == 4)));
    }

    #[test]
    fn test_self_dependency_is_cycle() {
        let errors = validate_yaml(
            r#"
version: "1.0"
name: t
targets:
  root:
    recipe: ["true"]
  a:
    depends_on: [a]
    recipe: ["true"]
"#,
        );
        assert!(errors.contains(&ValidationError::DependencyCycle(vec![
            "a".to_string(),
            "a".to_string()
        ])));
    }

    #[test]
    fn test_no_root_target() {
        let errors = validate_yaml(
            r#"
version: "1.0"
name: t
targets:
  a:
    depends_on: [b]
    recipe: ["true"]
  b:
    depends_on: [a]
    recipe: ["true"]
"#,
        );
        assert!(errors.contains(&ValidationError::NoRootTarget));
    }

    #[test]
    fn test_empty_config_has_no_root() {
        let errors = validate_yaml("version: \"1.0\"\nname: t\n");
        assert_eq!(errors, vec![ValidationError::NoRootTarget]);
    }

    #[test]
    fn test_empty_procedure() {
        let errors = validate_yaml(
            r#"
version: "1.0"
name: t
targets:
  a: {}
"#,
        );
        assert_eq!(errors, vec![ValidationError::EmptyProcedure("a".to_string())]);
    }

    #[test]
    fn test_raw_setup_needs_check() {
        let errors = validate_yaml(
            r#"
version: "1.0"
name: t
targets:
  a:
    setup: ["make install"]
"#,
        );
        assert_eq!(errors, vec![ValidationError::NoCheckCommand("a".to_string())]);
    }

    #[test]
    fn test_setup_invocation_supplies_check() {
        let errors = validate_yaml(
            r#"
version: "1.0"
name: t
recipes:
  apt:
    params: [package]
    check: "dpkg -s {package}"
    setup: ["apt-get install -y {package}"]
targets:
  a:
    setup:
      - recipe: apt
        args: [git]
"#,
        );
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    }

    #[test]
    fn test_check_recipe_without_check_template() {
        let errors = validate_yaml(
            r#"
version: "1.0"
name: t
recipes:
  bare:
    setup: ["true"]
targets:
  a:
    recipe:
      - recipe: bare
"#,
        );
        assert_eq!(
            errors,
            vec![ValidationError::RecipeWithoutCheck {
                recipe: "bare".to_string(),
                target: "a".to_string(),
            }]
        );
    }

    #[test]
    fn test_recipe_cycle() {
        let errors = validate_yaml(
            r#"
version: "1.0"
name: t
recipes:
  x:
    check: "true"
    setup:
      - recipe: y
  y:
    setup:
      - recipe: x
targets:
  a:
    recipe:
      - recipe: x
"#,
        );
        assert_eq!(
            errors,
            vec![ValidationError::RecipeCycle(vec![
                "x".to_string(),
                "y".to_string(),
                "x".to_string()
            ])]
        );
    }

    #[test]
    fn test_collects_all_violations() {
        let errors = validate_yaml(
            r#"
version: "1.0"
name: t
targets:
  a:
    depends_on: [ghost]
  b:
    depends_on: [a]
    recipe:
      - recipe: nope
"#,
        );
        assert!(errors.len() >= 4, "expected every violation, got {:?}", errors);
        assert!(errors.contains(&ValidationError::NoRootTarget));
        assert!(errors.contains(&ValidationError::EmptyProcedure("a".to_string())));
    }
}
