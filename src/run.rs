use std::collections::{HashMap, HashSet, VecDeque};
use std::io::Write;
use std::path::Path;
use std::process::Command;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use thiserror::Error;

use crate::Workspace;
use crate::brief::{self, PROJECT_YAML};
use crate::housekeeping;
use crate::style;
use crate::tasks::{Exec, FailurePolicy, Guard, Step, Task, TaskSet};
use crate::theme::{BOLD, DIM, FAILURE, Painter, SUCCESS, WARNING};
use crate::vars::Var;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("unknown task: {0}")]
    UnknownTask(String),
    #[error("dependency cycle between tasks: {}", .0.join(", "))]
    Cycle(Vec<String>),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Treat ignored failures as real ones
    pub strict: bool,
    /// Continue after a failure, skipping tasks that depend on it
    pub keep_going: bool,
    /// No progress lines or summary
    pub quiet: bool,
}

#[derive(Debug)]
pub struct RunResult {
    /// Exit code of the first failure, 0 when everything passed
    pub exit_code: i32,
    /// Task ids in execution order, including skipped ones
    pub ran: Vec<String>,
    /// Tasks that failed or were skipped because a dependency failed
    pub failed_ids: HashSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepStatus {
    Passed,
    Failed(i32),
}

/// Expand selected tasks to include all transitive dependencies, in catalog order.
pub(crate) fn expand_dependencies<'a>(selected: &[&'a Task], all: &'a [Task]) -> Vec<&'a Task> {
    let by_id: HashMap<&str, &Task> = all.iter().map(|t| (t.id.as_str(), t)).collect();

    let mut selected_ids: HashSet<&str> = selected.iter().map(|t| t.id.as_str()).collect();
    let mut queue: VecDeque<&str> = selected_ids.iter().copied().collect();
    while let Some(id) = queue.pop_front() {
        if let Some(task) = by_id.get(id) {
            for dep in &task.depends_on {
                if selected_ids.insert(dep.as_str()) {
                    queue.push_back(dep.as_str());
                }
            }
        }
    }

    all.iter()
        .filter(|t| selected_ids.contains(t.id.as_str()))
        .collect()
}

/// Kahn's algorithm; ties keep input order. Tasks caught in a cycle are left out.
pub(crate) fn topo_sort<'a>(tasks: &[&'a Task]) -> Vec<&'a Task> {
    let ids: HashSet<&str> = tasks.iter().map(|t| t.id.as_str()).collect();

    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    for task in tasks {
        let in_set = task.depends_on.iter().filter(|d| ids.contains(d.as_str()));
        in_degree.insert(&task.id, in_set.clone().count());
        for dep in in_set {
            dependents.entry(dep.as_str()).or_default().push(&task.id);
        }
    }

    let by_id: HashMap<&str, &'a Task> = tasks.iter().map(|t| (t.id.as_str(), *t)).collect();
    let mut queue: VecDeque<&str> = tasks
        .iter()
        .filter(|t| in_degree.get(t.id.as_str()) == Some(&0))
        .map(|t| t.id.as_str())
        .collect();

    let mut result = Vec::with_capacity(tasks.len());
    while let Some(id) = queue.pop_front() {
        if let Some(task) = by_id.get(id) {
            result.push(*task);
        }
        for &dependent in dependents.get(id).into_iter().flatten() {
            if let Some(deg) = in_degree.get_mut(dependent) {
                *deg -= 1;
                if *deg == 0 {
                    queue.push_back(dependent);
                }
            }
        }
    }
    result
}

fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let tenths = d.subsec_millis() / 100;
    if total_secs < 60 {
        format!("{total_secs}.{tenths}s")
    } else {
        format!("{}m {}.{tenths}s", total_secs / 60, total_secs % 60)
    }
}

fn relative<'p>(root: &Path, path: &'p Path) -> std::borrow::Cow<'p, str> {
    path.strip_prefix(root).unwrap_or(path).to_string_lossy()
}

/// Sequential executor for one run
struct Runner<'a> {
    workspace: &'a Workspace,
    options: RunOptions,
    painter: Painter,
}

impl Runner<'_> {
    fn root(&self) -> &Path {
        &self.workspace.root
    }

    fn settle(&self, policy: FailurePolicy, code: i32, what: &str) -> StepStatus {
        if code == 0 {
            StepStatus::Passed
        } else if policy == FailurePolicy::Ignore && !self.options.strict {
            warn!("`{what}` failed with exit code {code} (ignored)");
            StepStatus::Passed
        } else {
            StepStatus::Failed(code)
        }
    }

    fn spawn(&self, command: &mut Command, what: &str) -> i32 {
        debug!("Running {what}");
        match command.status() {
            Ok(status) => status.code().unwrap_or(1),
            Err(e) => {
                error!("unable to run `{what}`: {e}");
                1
            }
        }
    }

    fn exec(&self, exec: &Exec) -> StepStatus {
        match &exec.guard {
            Some(Guard::File(path)) if !path.exists() => {
                warn!("{} not found, skipping", relative(self.root(), path));
                return StepStatus::Passed;
            }
            Some(Guard::Program) if which::which(&exec.program).is_err() => {
                warn!(
                    "{} not found, skipping",
                    relative(self.root(), &exec.program)
                );
                return StepStatus::Passed;
            }
            _ => {}
        }
        let what = exec.to_string();
        let code = self.spawn(
            Command::new(&exec.program)
                .args(&exec.args)
                .current_dir(self.root()),
            &what,
        );
        self.settle(exec.policy, code, &what)
    }

    fn ensure_venv(&self) -> StepStatus {
        let venv = self.workspace.vars.path(Var::Venv, self.root());
        if venv.exists() {
            debug!("{} already exists", venv.display());
            return StepStatus::Passed;
        }
        info!("Creating virtualenv {}", relative(self.root(), &venv));
        self.exec(
            &Exec::new(self.workspace.vars.program(Var::Py, self.root()))
                .arg("-m")
                .arg("venv")
                .arg(&venv),
        )
    }

    #[allow(clippy::too_many_lines)]
    fn step(&self, step: &Step, out: &mut dyn Write) -> StepStatus {
        let root = self.root();
        let venv = self.workspace.vars.path(Var::Venv, root);
        match step {
            Step::Exec(exec) => self.exec(exec),
            Step::Shell {
                cmd,
                cwd,
                env,
                policy,
            } => {
                let cwd = if cwd.as_os_str().is_empty() {
                    root
                } else {
                    cwd.as_path()
                };
                let code = self.spawn(
                    Command::new("sh")
                        .arg("-c")
                        .arg(cmd)
                        .current_dir(cwd)
                        .envs(env),
                    cmd,
                );
                self.settle(*policy, code, cmd)
            }
            Step::EnsureVenv => self.ensure_venv(),
            Step::RequireFile { path, hint } => {
                if path.exists() {
                    StepStatus::Passed
                } else {
                    error!("{} not found: {hint}", relative(root, path));
                    StepStatus::Failed(2)
                }
            }
            Step::Usage(message) => {
                if let Err(e) = writeln!(out, "{message}") {
                    error!("Failed to write usage: {e}");
                    return StepStatus::Failed(1);
                }
                StepStatus::Failed(2)
            }
            Step::Brief(source) => match brief::run(root, source, out) {
                Ok(_) => StepStatus::Passed,
                Err(e) => {
                    error!("{e}");
                    StepStatus::Failed(e.exit_code())
                }
            },
            Step::ValidateBrief => match brief::validate_file(&root.join(PROJECT_YAML)) {
                Ok(_) => {
                    info!("{PROJECT_YAML} is valid");
                    StepStatus::Passed
                }
                Err(e) => {
                    error!("{e}");
                    StepStatus::Failed(e.exit_code())
                }
            },
            Step::StyleLint(options) => match style::run(root, options, out) {
                Ok(0) => StepStatus::Passed,
                Ok(code) => StepStatus::Failed(code),
                Err(e) => {
                    error!("{e}");
                    StepStatus::Failed(e.exit_code())
                }
            },
            Step::Clean(scope) => match housekeeping::clean(root, *scope, &venv) {
                Ok(_) => StepStatus::Passed,
                Err(e) => {
                    error!("{e}");
                    StepStatus::Failed(1)
                }
            },
            Step::Tree { depth } => match housekeeping::render_tree(root, *depth, &venv) {
                Ok(tree) => match write!(out, "{tree}") {
                    Ok(()) => StepStatus::Passed,
                    Err(e) => {
                        error!("Failed to write tree: {e}");
                        StepStatus::Failed(1)
                    }
                },
                Err(e) => {
                    error!("{e}");
                    StepStatus::Failed(1)
                }
            },
        }
    }

    fn task(&self, task: &Task, out: &mut dyn Write) -> StepStatus {
        for step in &task.steps {
            if let StepStatus::Failed(code) = self.step(step, out) {
                return StepStatus::Failed(code);
            }
        }
        StepStatus::Passed
    }

    fn progress(&self, line: &str) {
        if !self.options.quiet {
            eprintln!("{line}");
        }
    }

    fn summary(&self, passed: usize, failed: usize, skipped: usize, total: usize, elapsed: Duration) {
        let sty = &self.painter;
        let mut parts = Vec::new();
        if passed > 0 {
            parts.push(sty.paint(SUCCESS, &format!("{passed} passed")));
        }
        if failed > 0 {
            parts.push(sty.paint(FAILURE, &format!("{failed} failed")));
        }
        if skipped > 0 {
            parts.push(sty.paint(WARNING, &format!("{skipped} skipped")));
        }
        self.progress(&format!(
            "\n{} {} {}",
            sty.paint(BOLD, &format!("{total} tasks:")),
            parts.join(&sty.paint(DIM, ", ")),
            sty.paint(DIM, &format!("({})", format_duration(elapsed)))
        ));
    }
}

/// Run `targets` and everything they depend on, in dependency order.
///
/// Child processes inherit stdio; stage output (brief, style report, tree)
/// goes to `out`; progress goes to stderr.
///
/// # Errors
///
/// Returns `RunError::UnknownTask` for a target that is not in `tasks` and
/// `RunError::Cycle` when the dependencies cannot be ordered.
pub fn run(
    workspace: &Workspace,
    tasks: &TaskSet,
    targets: &[String],
    options: RunOptions,
    out: &mut dyn Write,
) -> Result<RunResult, RunError> {
    let selected = targets
        .iter()
        .map(|id| tasks.get(id).ok_or_else(|| RunError::UnknownTask(id.clone())))
        .collect::<Result<Vec<_>, _>>()?;

    let expanded = expand_dependencies(&selected, tasks.all());
    let ordered = topo_sort(&expanded);
    if ordered.len() < expanded.len() {
        let placed: HashSet<&str> = ordered.iter().map(|t| t.id.as_str()).collect();
        return Err(RunError::Cycle(
            expanded
                .iter()
                .filter(|t| !placed.contains(t.id.as_str()))
                .map(|t| t.id.clone())
                .collect(),
        ));
    }

    let runner = Runner {
        workspace,
        options,
        painter: Painter::stderr(),
    };
    let sty = &runner.painter;
    let total = ordered.len();
    let width = total.to_string().len();
    let started = Instant::now();
    let (mut passed, mut skipped) = (0usize, 0usize);
    let mut exit_code = 0;
    let mut ran = Vec::with_capacity(total);
    let mut failed_ids: HashSet<String> = HashSet::new();

    for (i, task) in ordered.iter().enumerate() {
        let prefix = format!("[{:>width$}/{total}]", i + 1);
        ran.push(task.id.clone());

        if task.depends_on.iter().any(|d| failed_ids.contains(d)) {
            runner.progress(&format!(
                "{} {} {}",
                sty.paint(DIM, &prefix),
                task.id,
                sty.paint(WARNING, "SKIP (dependency failed)")
            ));
            failed_ids.insert(task.id.clone());
            skipped += 1;
            continue;
        }

        runner.progress(&format!("{} {}", sty.paint(BOLD, &prefix), task.id));
        let task_started = Instant::now();
        let status = runner.task(task, out);
        let elapsed = sty.paint(DIM, &format_duration(task_started.elapsed()));

        match status {
            StepStatus::Passed => {
                runner.progress(&format!(
                    "{} {} {} {elapsed}",
                    sty.paint(DIM, &prefix),
                    task.id,
                    sty.paint(SUCCESS, "PASS")
                ));
                passed += 1;
            }
            StepStatus::Failed(code) => {
                runner.progress(&format!(
                    "{} {} {} {elapsed}",
                    sty.paint(DIM, &prefix),
                    task.id,
                    sty.paint(FAILURE, &format!("FAIL (exit {code})"))
                ));
                failed_ids.insert(task.id.clone());
                if exit_code == 0 {
                    exit_code = code;
                }
                if !options.keep_going {
                    break;
                }
            }
        }
    }

    runner.summary(
        passed,
        failed_ids.len() - skipped,
        skipped,
        total,
        started.elapsed(),
    );
    Ok(RunResult {
        exit_code,
        ran,
        failed_ids,
    })
}
