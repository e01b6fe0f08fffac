//! Overridable variables shared by all built-in targets
//!
//! Every variable has a default; values are layered as
//! default < config file `vars` < process environment < `--set KEY=VALUE`.
//! `PIP`, `YAMLLINT` and `PYTEST` default to binaries inside the resolved `VENV`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::debug;

use crate::config_file::ConfigError;

/// Names of the variables a user may override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Var {
    Venv,
    Py,
    Pip,
    Yamllint,
    Pytest,
    ReqDev,
    StyleGlob,
    StyleJson,
}

impl Var {
    pub const ALL: [Var; 8] = [
        Var::Venv,
        Var::Py,
        Var::Pip,
        Var::Yamllint,
        Var::Pytest,
        Var::ReqDev,
        Var::StyleGlob,
        Var::StyleJson,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Var::Venv => "VENV",
            Var::Py => "PY",
            Var::Pip => "PIP",
            Var::Yamllint => "YAMLLINT",
            Var::Pytest => "PYTEST",
            Var::ReqDev => "REQ_DEV",
            Var::StyleGlob => "STYLE_GLOB",
            Var::StyleJson => "STYLE_JSON",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Var> {
        Var::ALL.into_iter().find(|v| v.name() == name)
    }

    fn default_value(self, venv: &str) -> String {
        match self {
            Var::Venv => ".venv".to_string(),
            Var::Py => "python3".to_string(),
            Var::Pip => format!("{venv}/bin/pip"),
            Var::Yamllint => format!("{venv}/bin/yamllint"),
            Var::Pytest => format!("{venv}/bin/pytest"),
            Var::ReqDev => "requirements-dev.txt".to_string(),
            Var::StyleGlob => "drafts/**/*.md".to_string(),
            Var::StyleJson => "build/style_report.json".to_string(),
        }
    }
}

/// Resolved variable values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vars {
    values: HashMap<Var, String>,
}

impl Default for Vars {
    fn default() -> Self {
        Self::resolve(&HashMap::new(), |_| None, &[]).unwrap_or_else(|_| Vars {
            values: HashMap::new(),
        })
    }
}

/// Parse a `KEY=VALUE` command-line assignment.
///
/// # Errors
///
/// Returns `ConfigError::InvalidAssignment` when there is no `=` or the key is empty,
/// and `ConfigError::UnknownVariable` when the key is not an overridable variable.
pub fn parse_assignment(s: &str) -> Result<(String, String), ConfigError> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| ConfigError::InvalidAssignment(s.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(ConfigError::InvalidAssignment(s.to_string()));
    }
    if Var::from_name(key).is_none() {
        return Err(ConfigError::UnknownVariable(key.to_string()));
    }
    Ok((key.to_string(), value.to_string()))
}

impl Vars {
    /// Layer config-file values, environment lookups and command-line assignments over the defaults.
    ///
    /// Empty environment values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownVariable` if the config file or an assignment names
    /// a variable that does not exist.
    pub fn resolve<F>(
        file: &HashMap<String, String>,
        env: F,
        assignments: &[(String, String)],
    ) -> Result<Vars, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        for name in file.keys().chain(assignments.iter().map(|(k, _)| k)) {
            if Var::from_name(name).is_none() {
                return Err(ConfigError::UnknownVariable(name.clone()));
            }
        }

        let lookup = |var: Var| -> Option<String> {
            assignments
                .iter()
                .rev()
                .find(|(k, _)| k == var.name())
                .map(|(_, v)| v.clone())
                .or_else(|| env(var.name()).filter(|v| !v.is_empty()))
                .or_else(|| file.get(var.name()).cloned())
        };

        let venv = lookup(Var::Venv).unwrap_or_else(|| Var::Venv.default_value(""));
        let mut values = HashMap::new();
        for var in Var::ALL {
            let value = lookup(var).unwrap_or_else(|| var.default_value(&venv));
            debug!("{} = {value}", var.name());
            values.insert(var, value);
        }
        Ok(Vars { values })
    }

    #[must_use]
    pub fn get(&self, var: Var) -> &str {
        self.values.get(&var).map_or("", String::as_str)
    }

    /// Value of `var` as a path, resolved against the workspace root when relative.
    #[must_use]
    pub fn path(&self, var: Var, root: &Path) -> PathBuf {
        resolve_path(root, self.get(var))
    }

    /// Value of `var` as a program to execute.
    ///
    /// Bare names are left for `PATH` lookup; anything with a separator is
    /// resolved against the workspace root.
    #[must_use]
    pub fn program(&self, var: Var, root: &Path) -> PathBuf {
        let value = self.get(var);
        if value.contains('/') {
            resolve_path(root, value)
        } else {
            PathBuf::from(value)
        }
    }
}

fn resolve_path(root: &Path, value: &str) -> PathBuf {
    let path = PathBuf::from(value);
    if path.is_relative() {
        root.join(path)
    } else {
        path
    }
}
