use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use log::error;

use bookforge::Workspace;
use bookforge::style::{self, LintOptions, Overrides, parse_target_len};

use crate::exit_code;

#[derive(Args, Debug)]
pub struct StyleArgs {
    /// Files, directories or glob patterns (default: current directory)
    paths: Vec<String>,

    /// Save the JSON report to this path
    #[arg(long = "json", value_name = "PATH")]
    json_out: Option<PathBuf>,

    /// Apply safe autofixes (whitespace only) before checking
    #[arg(long)]
    fix: bool,

    /// Pattern used inside directories (default: **/*.md and **/*.txt)
    #[arg(long, value_name = "PATTERN")]
    glob: Option<String>,

    /// Exclude pattern, relative to the workspace root; can be repeated
    #[arg(long, value_name = "PATTERN")]
    exclude: Vec<String>,

    /// Maximum words per sentence
    #[arg(long, value_name = "N")]
    max_sent: Option<usize>,

    /// Target sentence length range
    #[arg(long, value_name = "A,B", value_parser = parse_target_len)]
    target_len: Option<(usize, usize)>,

    /// Maximum sentences per paragraph
    #[arg(long, value_name = "N")]
    max_para: Option<usize>,

    /// Allow passive voice
    #[arg(long)]
    passive_allow: bool,

    /// Require a metric next to vague claims
    #[arg(long, value_name = "0|1", value_parser = clap::value_parser!(u8).range(0..=1))]
    require_metrics: Option<u8>,
}

impl StyleArgs {
    /// Linter options with paths anchored at the current directory.
    fn options(&self) -> Result<LintOptions, std::io::Error> {
        let cwd = std::env::current_dir()?;
        Ok(LintOptions {
            paths: self
                .paths
                .iter()
                .map(|p| cwd.join(p).to_string_lossy().into_owned())
                .collect(),
            glob: self.glob.clone(),
            excludes: self.exclude.clone(),
            fix: self.fix,
            json_out: self.json_out.as_ref().map(|p| cwd.join(p)),
            overrides: Overrides {
                max_sentence_len: self.max_sent,
                target_len: self.target_len,
                max_paragraph_sentences: self.max_para,
                passive_allowed: self.passive_allow,
                require_metrics: self.require_metrics.map(|v| v == 1),
            },
        })
    }
}

/// Run the style linter and exit 0 (clean), 1 (errors found) or 2 (usage).
///
/// # Errors
///
/// Returns an error if the current directory cannot be determined.
pub fn run(args: &StyleArgs, workspace: &Workspace) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut options = args.options()?;
    if args.paths.is_empty() {
        options.paths = vec![std::env::current_dir()?.to_string_lossy().into_owned()];
    }
    match style::run(&workspace.root, &options, &mut std::io::stdout()) {
        Ok(code) => Ok(exit_code(code)),
        Err(e) => {
            error!("{e}");
            Ok(exit_code(e.exit_code()))
        }
    }
}
