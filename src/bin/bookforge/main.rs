mod stage;
mod style;
mod targets;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use bookforge::load_config;
use bookforge::run::RunOptions;
use bookforge::tasks::builtin::BriefParams;
use bookforge::vars::parse_assignment;

#[derive(Parser, Debug)]
#[command(
    name = "bookforge",
    version,
    about = "Task dispatcher for a book-production repository"
)]
struct Cli {
    /// Path to config file (auto-detected if not specified)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Override a variable (VENV, PY, PIP, YAMLLINT, PYTEST, REQ_DEV, STYLE_GLOB, STYLE_JSON)
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment, global = true)]
    assignments: Vec<(String, String)>,

    /// Fail on errors that targets normally ignore (tests, YAML lint)
    #[arg(long, global = true)]
    strict: bool,

    /// Keep running independent tasks after a failure
    #[arg(long, global = true)]
    keep_going: bool,

    /// Hide progress lines and the summary
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log file path (timestamped copy of every log line)
    #[arg(long, global = true)]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run main.py with PY
    Bootstrap,
    /// Create VENV and install requirements.txt
    InitVenv,
    /// Alias of init-venv
    Install,
    /// Install REQ_DEV on top of install (skipped when the file is absent)
    InstallDev,
    /// Generate config/project.yaml from topic, audience, pages and outputs
    Brief(targets::BriefArgs),
    /// Generate config/project.yaml from a JSON payload
    BriefJson(targets::BriefJsonArgs),
    /// Lint and validate config/project.yaml, then run its tests
    CheckBrief,
    /// Run the test suite with PYTEST
    Test,
    /// Lint config/ with YAMLLINT
    LintYaml,
    /// Alias of lint-yaml
    Lint,
    /// Style-lint drafts matching STYLE_GLOB
    StyleLint,
    /// Style-lint drafts and apply safe whitespace fixes
    StyleLintFix,
    /// Style-lint drafts and write the JSON report to STYLE_JSON
    StyleLintJson,
    /// Remove build/, dist/ and *.egg-info
    Clean,
    /// clean, plus tool caches, __pycache__ and *.pyc
    CleanAll,
    /// Remove VENV
    CleanVenv,
    /// Show the project tree (depth 3)
    Tree,
    /// Show the project tree (depth 5)
    TreeWide,
    /// Run built-in targets or tasks from the config file
    Run {
        #[arg(required = true, value_name = "TASK")]
        tasks: Vec<String>,
    },
    /// List every target and task
    List,
    /// Run the style linter with full control over its options
    Style(style::StyleArgs),
    /// Run a pipeline stage directly
    Stage(stage::StageArgs),
}

impl Commands {
    /// Built-in target this subcommand is a shortcut for
    fn target(&self) -> Option<&'static str> {
        Some(match self {
            Commands::Bootstrap => "bootstrap",
            Commands::InitVenv => "init-venv",
            Commands::Install => "install",
            Commands::InstallDev => "install-dev",
            Commands::Brief(_) => "brief",
            Commands::BriefJson(_) => "brief-json",
            Commands::CheckBrief => "check-brief",
            Commands::Test => "test",
            Commands::LintYaml => "lint-yaml",
            Commands::Lint => "lint",
            Commands::StyleLint => "style-lint",
            Commands::StyleLintFix => "style-lint-fix",
            Commands::StyleLintJson => "style-lint-json",
            Commands::Clean => "clean",
            Commands::CleanAll => "clean-all",
            Commands::CleanVenv => "clean-venv",
            Commands::Tree => "tree",
            Commands::TreeWide => "tree-wide",
            Commands::Run { .. } | Commands::List | Commands::Style(_) | Commands::Stage(_) => {
                return None;
            }
        })
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let log_file = cli
        .log_file
        .as_ref()
        .map(std::fs::File::create)
        .transpose()?;
    bookforge::logger::init(log_file)?;

    let workspace = load_config(cli.config.as_deref(), &cli.assignments)?;
    let options = RunOptions {
        strict: cli.strict,
        keep_going: cli.keep_going,
        quiet: cli.quiet,
    };

    if let Some(target) = cli.command.target() {
        let params = match &cli.command {
            Commands::Brief(args) => args.params(),
            Commands::BriefJson(args) => args.params(),
            _ => BriefParams::default(),
        };
        return targets::run(&workspace, &params, &[target.to_string()], options);
    }

    match cli.command {
        Commands::Run { tasks } => {
            targets::run(&workspace, &BriefParams::from_env(), &tasks, options)
        }
        Commands::List => targets::list(&workspace, cli.strict),
        Commands::Style(args) => style::run(&args, &workspace),
        Commands::Stage(args) => stage::run(&args, &workspace),
        _ => Ok(ExitCode::SUCCESS),
    }
}

/// Clamp a process exit code into the range `ExitCode` accepts.
pub(crate) fn exit_code(code: i32) -> ExitCode {
    match u8::try_from(code) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(code) => ExitCode::from(code),
        Err(_) => ExitCode::FAILURE,
    }
}
