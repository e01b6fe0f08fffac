use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

use crate::brief::BriefSource;
use crate::housekeeping::CleanScope;
use crate::style::LintOptions;

/// A named unit of work with its dependencies and ordered steps
#[derive(Debug, Clone, Default)]
pub struct Task {
    pub id: String,
    pub description: String,
    pub depends_on: Vec<String>,
    pub steps: Vec<Step>,
}

impl Task {
    /// True when at least one step's failure is ignored outside strict runs.
    #[must_use]
    pub fn ignores_failures(&self) -> bool {
        self.steps.iter().any(|step| match step {
            Step::Exec(exec) => exec.policy == FailurePolicy::Ignore,
            Step::Shell { policy, .. } => *policy == FailurePolicy::Ignore,
            _ => false,
        })
    }
}

/// What happens to the task when a step fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    #[default]
    Fail,
    /// Report the failure but keep going, unless the run is strict
    Ignore,
}

/// Precondition that turns a step into a warning when unmet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    /// The file must exist
    File(PathBuf),
    /// The step's own program must be installed
    Program,
}

/// An external program invocation
#[derive(Debug, Clone, Default)]
pub struct Exec {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub policy: FailurePolicy,
    pub guard: Option<Guard>,
}

impl Exec {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Exec {
            program: program.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn ignore_failure(mut self) -> Self {
        self.policy = FailurePolicy::Ignore;
        self
    }

    #[must_use]
    pub fn guard(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }
}

impl fmt::Display for Exec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// A single action inside a task
#[derive(Debug, Clone)]
pub enum Step {
    Exec(Exec),
    /// User-defined shell command, run with `sh -c`
    Shell {
        cmd: String,
        cwd: PathBuf,
        env: HashMap<String, String>,
        policy: FailurePolicy,
    },
    /// Create the virtualenv if it does not exist yet
    EnsureVenv,
    /// Abort with a usage error unless the file exists
    RequireFile { path: PathBuf, hint: String },
    /// Abort with a usage error; parameters were missing or malformed
    Usage(String),
    Brief(BriefSource),
    ValidateBrief,
    StyleLint(LintOptions),
    Clean(CleanScope),
    Tree { depth: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_display() {
        let exec = Exec::new(".venv/bin/pip")
            .arg("install")
            .arg("-r")
            .arg("requirements.txt");
        assert_eq!(exec.to_string(), ".venv/bin/pip install -r requirements.txt");
    }

    #[test]
    fn test_exec_builders() {
        let exec = Exec::new("pytest")
            .ignore_failure()
            .guard(Guard::Program);
        assert_eq!(exec.policy, FailurePolicy::Ignore);
        assert_eq!(exec.guard, Some(Guard::Program));
    }

    #[test]
    fn test_ignores_failures() {
        let mut task = Task {
            id: "test".to_string(),
            steps: vec![Step::EnsureVenv, Step::Exec(Exec::new("pytest"))],
            ..Default::default()
        };
        assert!(!task.ignores_failures());
        task.steps.push(Step::Exec(Exec::new("pytest").ignore_failure()));
        assert!(task.ignores_failures());
    }
}
