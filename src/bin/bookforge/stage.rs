use std::process::ExitCode;

use clap::{Args, Subcommand};
use log::error;

use bookforge::Workspace;
use bookforge::brief::{self, BriefError, BriefSource};

use crate::exit_code;

#[derive(Args, Debug)]
pub struct StageArgs {
    #[command(subcommand)]
    stage: Stage,
}

#[derive(Subcommand, Debug)]
enum Stage {
    /// Product brief: writes config/project.yaml
    ProductBrief {
        #[command(subcommand)]
        action: BriefAction,
    },
}

#[derive(Subcommand, Debug)]
enum BriefAction {
    /// Generate and validate the project config
    Run(BriefRunArgs),
}

#[derive(Args, Debug)]
struct BriefRunArgs {
    /// JSON payload with topic, audience, target_pages and optional outputs
    #[arg(long, conflicts_with_all = ["topic", "audience", "target_pages", "outputs"])]
    json: Option<String>,

    #[arg(long)]
    topic: Option<String>,

    #[arg(long)]
    audience: Option<String>,

    #[arg(long)]
    target_pages: Option<u32>,

    /// Comma-separated export formats
    #[arg(long)]
    outputs: Option<String>,
}

impl BriefRunArgs {
    fn source(&self) -> Result<BriefSource, BriefError> {
        BriefSource::from_parts(
            self.json.clone(),
            self.topic.clone(),
            self.audience.clone(),
            self.target_pages,
            self.outputs.clone(),
        )
    }
}

/// Run a stage; exits 2 on bad input and 3 when the generated project is invalid.
///
/// # Errors
///
/// Never returns an error itself; stage failures become exit codes.
pub fn run(args: &StageArgs, workspace: &Workspace) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let Stage::ProductBrief {
        action: BriefAction::Run(run_args),
    } = &args.stage;

    let result = run_args
        .source()
        .and_then(|source| brief::run(&workspace.root, &source, &mut std::io::stdout()));
    match result {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            error!("{e}");
            Ok(exit_code(e.exit_code()))
        }
    }
}
