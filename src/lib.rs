//! Core implementation of the bookforge task dispatcher
//!
//! bookforge runs the day-to-day targets of a book-production repository:
//! virtualenv setup, the product-brief stage, YAML and style linting, tests and
//! housekeeping. Targets are plain tasks with dependencies, so an optional
//! `.bookforge.yaml` can override variables and add tasks of its own.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::config_file::{Config, ConfigError, ConfigTask};
use crate::tasks::builtin::{BUILTIN_IDS, BriefParams, builtin_tasks};
use crate::tasks::{Task, TaskSet};
use crate::vars::Vars;

pub mod brief;
pub mod config_file;
pub mod housekeeping;
pub mod logger;
pub mod run;
pub mod style;
pub mod tasks;
pub mod theme;
pub mod vars;

/// The directory bookforge operates on, with its resolved variables and user tasks
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Directory holding the config file, or the current directory without one
    pub root: PathBuf,
    pub config_path: Option<PathBuf>,
    pub vars: Vars,
    pub user_tasks: Vec<Task>,
}

impl Workspace {
    /// Built-in targets followed by the user's tasks.
    #[must_use]
    pub fn task_set(&self, params: &BriefParams) -> TaskSet {
        TaskSet::new(
            builtin_tasks(&self.root, &self.vars, params),
            self.user_tasks.clone(),
        )
    }
}

/// Load the workspace from a config file (or auto-detect one) and the process environment.
///
/// # Errors
///
/// Returns `ConfigError` if an explicit config file is missing, the file cannot be
/// parsed, its tasks are invalid, or a variable override names an unknown variable.
pub fn load_config(
    config_file: Option<&str>,
    assignments: &[(String, String)],
) -> Result<Workspace, ConfigError> {
    let cwd = std::env::current_dir()
        .map_err(|e| ConfigError::UnknownWorkingDirectory(e.to_string()))?;
    load_workspace(&cwd, config_file.map(Path::new), assignments, |name| {
        std::env::var(name).ok()
    })
}

/// Like [`load_config`], relative to `cwd` and with an explicit environment lookup.
///
/// # Errors
///
/// See [`load_config`].
pub fn load_workspace<F>(
    cwd: &Path,
    config_file: Option<&Path>,
    assignments: &[(String, String)],
    env: F,
) -> Result<Workspace, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let config_path = match config_file {
        Some(file) => {
            let path = cwd.join(file);
            if !path.exists() {
                return Err(ConfigError::ConfigNotFound(path));
            }
            Some(path)
        }
        None => Config::find_config_from(cwd),
    };

    let (root, parsed) = match &config_path {
        Some(path) => {
            let root = path
                .parent()
                .ok_or_else(|| ConfigError::ConfigNotFound(path.clone()))?
                .to_path_buf();
            (root, Config::from_file(path)?)
        }
        None => {
            debug!("No config file found, using {}", cwd.display());
            (cwd.to_path_buf(), Config::default())
        }
    };
    debug!("Workspace root: {}", root.display());

    if let Some(version) = &parsed.bookforge_version {
        validate_version(version);
    }
    validate_tasks(&parsed.tasks)?;
    let vars = Vars::resolve(&parsed.vars, env, assignments)?;
    let user_tasks = parsed
        .tasks
        .into_iter()
        .map(|task| task.into_task(&root))
        .collect();

    Ok(Workspace {
        root,
        config_path,
        vars,
        user_tasks,
    })
}

/// Warn if the config's `bookforge_version` doesn't match the binary version
fn validate_version(config_version: &str) {
    let binary_version = env!("CARGO_PKG_VERSION");
    if config_version != binary_version {
        warn!(
            "Config bookforge_version '{config_version}' differs from binary version '{binary_version}'"
        );
    }
}

fn task_id(task: &ConfigTask) -> &str {
    task.id.as_deref().unwrap_or(&task.name)
}

/// Validate user tasks for duplicate IDs, empty values, dangling dependencies and cycles
fn validate_tasks(tasks: &[ConfigTask]) -> Result<(), ConfigError> {
    let mut seen: HashSet<&str> = BUILTIN_IDS.into_iter().collect();
    for task in tasks {
        if !seen.insert(task_id(task)) {
            return Err(ConfigError::DuplicateId(task_id(task).to_string()));
        }
        if task.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Task with id '{}' has an empty name",
                task_id(task)
            )));
        }
        if task.cmd.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Task '{}' has an empty cmd string",
                task.name
            )));
        }
    }

    for task in tasks {
        for dep in task.depends_on.iter().flatten() {
            if !seen.contains(dep.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "Task '{}' depends on '{dep}' which does not exist",
                    task.name
                )));
            }
        }
    }

    let mut visited = HashSet::new();
    let mut stack = HashSet::new();
    for task in tasks {
        if !visited.contains(task_id(task)) {
            detect_cycle(task_id(task), tasks, &mut visited, &mut stack)?;
        }
    }
    Ok(())
}

fn detect_cycle<'a>(
    id: &'a str,
    tasks: &'a [ConfigTask],
    visited: &mut HashSet<&'a str>,
    stack: &mut HashSet<&'a str>,
) -> Result<(), ConfigError> {
    visited.insert(id);
    stack.insert(id);

    if let Some(task) = tasks.iter().find(|t| task_id(t) == id) {
        for dep in task.depends_on.iter().flatten() {
            let dep = dep.as_str();
            if !visited.contains(dep) {
                detect_cycle(dep, tasks, visited, stack)?;
            } else if stack.contains(dep) {
                return Err(ConfigError::Validation(format!(
                    "Circular dependency detected involving '{dep}'"
                )));
            }
        }
    }

    stack.remove(id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vars::Var;

    fn make_task(id: &str, deps: &[&str]) -> ConfigTask {
        ConfigTask {
            id: Some(id.to_string()),
            name: id.to_string(),
            cmd: "echo test".to_string(),
            cwd: None,
            env: None,
            depends_on: Some(deps.iter().map(ToString::to_string).collect()),
            allow_failure: None,
        }
    }

    #[test]
    fn test_duplicate_id_detection() {
        let result = validate_tasks(&[make_task("export", &[]), make_task("export", &[])]);
        match result.unwrap_err() {
            ConfigError::DuplicateId(id) => assert_eq!(id, "export"),
            other => panic!("Expected DuplicateId, got: {other:?}"),
        }
    }

    #[test]
    fn test_builtin_ids_are_reserved() {
        assert!(matches!(
            validate_tasks(&[make_task("lint", &[])]),
            Err(ConfigError::DuplicateId(id)) if id == "lint"
        ));
    }

    #[test]
    fn test_dependencies_resolve_to_user_or_builtin_tasks() {
        assert!(validate_tasks(&[make_task("export", &["style-lint"]), make_task("publish", &["export"])]).is_ok());
        assert!(matches!(
            validate_tasks(&[make_task("export", &["missing"])]),
            Err(ConfigError::Validation(msg)) if msg.contains("'missing'")
        ));
    }

    #[test]
    fn test_cycle_detection() {
        let result = validate_tasks(&[make_task("a", &["b"]), make_task("b", &["a"])]);
        assert!(matches!(
            result,
            Err(ConfigError::Validation(msg)) if msg.starts_with("Circular dependency")
        ));
    }

    #[test]
    fn test_empty_cmd_rejected() {
        let mut task = make_task("export", &[]);
        task.cmd = "  ".to_string();
        assert!(matches!(validate_tasks(&[task]), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_workspace_without_config() {
        let dir = tempfile::tempdir().unwrap();
        let ws = load_workspace(dir.path(), None, &[], |_| None).unwrap();
        assert_eq!(ws.root, dir.path());
        assert!(ws.config_path.is_none());
        assert_eq!(ws.vars.get(Var::Venv), ".venv");
    }

    #[test]
    fn test_workspace_from_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".bookforge.yaml"),
            "vars:\n  VENV: env\ntasks:\n  - name: export\n    cmd: echo export\n    depends_on: [style-lint]\n",
        )
        .unwrap();
        let nested = dir.path().join("drafts");
        std::fs::create_dir_all(&nested).unwrap();

        let ws = load_workspace(&nested, None, &[], |_| None).unwrap();
        assert_eq!(ws.root, dir.path());
        assert_eq!(ws.vars.get(Var::Pip), "env/bin/pip");
        let tasks = ws.task_set(&BriefParams::default());
        assert_eq!(tasks.get("export").unwrap().depends_on, vec!["style-lint"]);
        assert!(tasks.get("clean-all").is_some());
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_workspace(dir.path(), Some(Path::new("missing.yaml")), &[], |_| None),
            Err(ConfigError::ConfigNotFound(_))
        ));
    }

    #[test]
    fn test_unknown_variable_in_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".bookforge.yaml"), "vars:\n  NOPE: x\n").unwrap();
        assert!(matches!(
            load_workspace(dir.path(), None, &[], |_| None),
            Err(ConfigError::UnknownVariable(name)) if name == "NOPE"
        ));
    }
}
