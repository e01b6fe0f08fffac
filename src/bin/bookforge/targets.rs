use std::io::Write;
use std::process::ExitCode;

use clap::Args;

use bookforge::Workspace;
use bookforge::run::{self, RunOptions};
use bookforge::tasks::builtin::BriefParams;
use bookforge::theme::{ACCENT, DIM, Painter, WARNING};

use crate::exit_code;

#[derive(Args, Debug)]
pub struct BriefArgs {
    /// Book topic
    #[arg(long, env = "TOPIC")]
    topic: Option<String>,

    /// Target audience
    #[arg(long, env = "AUDIENCE")]
    audience: Option<String>,

    /// Target page count
    #[arg(long, env = "PAGES")]
    pages: Option<String>,

    /// Comma-separated export formats, e.g. DOCX,PDF,EPUB
    #[arg(long, env = "OUTPUTS")]
    outputs: Option<String>,
}

impl BriefArgs {
    pub fn params(&self) -> BriefParams {
        BriefParams {
            topic: self.topic.clone(),
            audience: self.audience.clone(),
            pages: self.pages.clone(),
            outputs: self.outputs.clone(),
            json: None,
        }
    }
}

#[derive(Args, Debug)]
pub struct BriefJsonArgs {
    /// Payload such as '{"topic":"…","audience":"…","target_pages":160}'
    #[arg(env = "JSON")]
    json: Option<String>,
}

impl BriefJsonArgs {
    pub fn params(&self) -> BriefParams {
        BriefParams {
            json: self.json.clone(),
            ..Default::default()
        }
    }
}

/// Run `targets` with their dependencies and turn the result into an exit code.
///
/// # Errors
///
/// Returns an error for unknown tasks or a dependency cycle.
pub fn run(
    workspace: &Workspace,
    params: &BriefParams,
    targets: &[String],
    options: RunOptions,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let tasks = workspace.task_set(params);
    let result = run::run(workspace, &tasks, targets, options, &mut std::io::stdout())?;
    Ok(exit_code(result.exit_code))
}

/// Print every task with its description and dependencies.
///
/// # Errors
///
/// Returns an error if stdout cannot be written.
pub fn list(workspace: &Workspace, strict: bool) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let sty = Painter::stdout();
    let tasks = workspace.task_set(&BriefParams::default());
    let width = tasks.all().iter().map(|t| t.id.len()).max().unwrap_or(0);

    let mut out = std::io::stdout().lock();
    for task in tasks.all() {
        let id = format!("{:<width$}", task.id);
        write!(out, "{}  {}", sty.paint(ACCENT, &id), task.description)?;
        if !task.depends_on.is_empty() {
            let deps = format!("(after {})", task.depends_on.join(", "));
            write!(out, " {}", sty.paint(DIM, &deps))?;
        }
        if task.ignores_failures() && !strict {
            write!(out, " {}", sty.paint(WARNING, "[failures ignored]"))?;
        }
        writeln!(out)?;
    }
    Ok(ExitCode::SUCCESS)
}
