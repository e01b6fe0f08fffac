//! Configuration file handling for bookforge

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tasks::{FailurePolicy, Step, Task};

/// Errors that can occur while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),
    #[error("Unknown working directory: {0}")]
    UnknownWorkingDirectory(String),
    #[error("Unable to parse YAML config file {path}: {source}")]
    Yaml {
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("Unable to parse JSON config file {path}: {source}")]
    Json {
        source: serde_json::Error,
        path: PathBuf,
    },
    #[error("Duplicate task ID in config: {0}")]
    DuplicateId(String),
    #[error("Invalid config: {0}")]
    Validation(String),
    #[error("Unknown variable `{0}`")]
    UnknownVariable(String),
    #[error("Expected KEY=VALUE, got `{0}`")]
    InvalidAssignment(String),
}

/// Configuration for a user-defined task
#[derive(Debug, Deserialize, Serialize)]
pub struct ConfigTask {
    pub id: Option<String>,
    pub name: String,
    pub cmd: String,
    pub cwd: Option<PathBuf>,
    pub env: Option<HashMap<String, String>>,
    pub depends_on: Option<Vec<String>>,
    pub allow_failure: Option<bool>,
}

impl ConfigTask {
    /// Convert into a runnable task whose relative `cwd` is anchored at `root`.
    #[must_use]
    pub fn into_task(self, root: &Path) -> Task {
        let cwd = match self.cwd {
            Some(cwd) if cwd.is_relative() => root.join(cwd),
            Some(cwd) => cwd,
            None => root.to_path_buf(),
        };
        let policy = if self.allow_failure.unwrap_or(false) {
            FailurePolicy::Ignore
        } else {
            FailurePolicy::Fail
        };
        Task {
            id: self.id.unwrap_or_else(|| self.name.clone()),
            description: self.name,
            depends_on: self.depends_on.unwrap_or_default(),
            steps: vec![Step::Shell {
                cmd: self.cmd,
                cwd,
                env: self.env.unwrap_or_default(),
                policy,
            }],
        }
    }
}

/// Root configuration structure for bookforge
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    pub bookforge_version: Option<String>,
    #[serde(default)]
    pub vars: HashMap<String, String>,
    #[serde(default)]
    pub tasks: Vec<ConfigTask>,
}

/// List of supported configuration file names
const FILENAMES: [&str; 3] = [".bookforge.json", ".bookforge.yaml", ".bookforge.yml"];

impl Config {
    /// Loads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if the file cannot be read, or
    /// `ConfigError::Yaml`/`ConfigError::Json` if parsing fails.
    pub fn from_file(file: &Path) -> Result<Config, ConfigError> {
        let contents = std::fs::read_to_string(file)
            .map_err(|_| ConfigError::ConfigNotFound(file.to_path_buf()))?;
        if file.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&contents).map_err(|e| ConfigError::Json {
                source: e,
                path: file.to_path_buf(),
            })
        } else if contents.trim().is_empty() {
            Ok(Config::default())
        } else {
            serde_yaml::from_str(&contents).map_err(|e| ConfigError::Yaml {
                source: e,
                path: file.to_path_buf(),
            })
        }
    }

    /// Searches for a configuration file in `start` and its parents.
    #[must_use]
    pub fn find_config_from(start: &Path) -> Option<PathBuf> {
        let mut path = start.to_path_buf();
        debug!("Searching for config file in {}", start.display());
        loop {
            for file in &FILENAMES {
                let config_path = path.join(file);
                if config_path.exists() {
                    info!("Found config file: {}", config_path.display());
                    return Some(config_path);
                }
            }
            if !path.pop() {
                return None;
            }
        }
    }

    /// Searches for a configuration file in the current directory and its parents.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownWorkingDirectory` if the cwd cannot be determined.
    pub fn find_config() -> Result<Option<PathBuf>, ConfigError> {
        let cwd = std::env::current_dir()
            .map_err(|e| ConfigError::UnknownWorkingDirectory(e.to_string()))?;
        Ok(Self::find_config_from(&cwd))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_file_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".bookforge.json");
        std::fs::write(
            &path,
            r#"{
                "bookforge_version": "0.1.0",
                "vars": {"VENV": "env"},
                "tasks": [{"name": "export", "cmd": "echo export"}]
            }"#,
        )
        .unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.vars["VENV"], "env");
        assert_eq!(config.tasks[0].name, "export");
    }

    #[test]
    fn test_from_file_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".bookforge.yaml");
        std::fs::write(
            &path,
            "vars:\n  STYLE_GLOB: 'chapters/*.md'\ntasks:\n  - name: export\n    id: export\n    cmd: echo export\n",
        )
        .unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.vars["STYLE_GLOB"], "chapters/*.md");
        assert_eq!(config.tasks[0].id.as_deref(), Some("export"));
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".bookforge.yml");
        std::fs::write(&path, "\n").unwrap();
        let config = Config::from_file(&path).unwrap();
        assert!(config.tasks.is_empty());
        assert!(config.vars.is_empty());
    }

    #[test]
    fn test_find_config_walks_parents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".bookforge.yaml"), "tasks: []\n").unwrap();
        let nested = dir.path().join("drafts/part1");
        std::fs::create_dir_all(&nested).unwrap();
        let found = Config::find_config_from(&nested).unwrap();
        assert_eq!(found, dir.path().join(".bookforge.yaml"));
    }

    #[test]
    fn test_task_defaults() {
        let task = ConfigTask {
            id: None,
            name: "export".to_string(),
            cmd: "echo hi".to_string(),
            cwd: Some(PathBuf::from("build")),
            env: None,
            depends_on: None,
            allow_failure: Some(true),
        }
        .into_task(Path::new("/book"));
        assert_eq!(task.id, "export");
        match &task.steps[0] {
            Step::Shell { cwd, policy, .. } => {
                assert_eq!(cwd, Path::new("/book/build"));
                assert_eq!(*policy, FailurePolicy::Ignore);
            }
            other => panic!("Expected Shell step, got: {other:?}"),
        }
    }
}
