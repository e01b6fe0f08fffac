//! Style linter for manuscript drafts
//!
//! Checks `.md`/`.txt` files against `config/style.yaml`: sentence and paragraph
//! length, passive voice, banned phrases, vague claims without a metric and
//! glossary usage. Produces a Markdown report, optionally a JSON one, and can
//! apply whitespace-only fixes before checking.

use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info};
use thiserror::Error;

pub mod config;
pub mod report;
pub mod rules;
pub mod targets;
pub mod text;

pub use config::{Overrides, STYLE_YAML, Settings, StyleConfig, parse_target_len};
use report::FileReport;

#[derive(Error, Debug)]
pub enum StyleError {
    #[error("Missing {}", .0.display())]
    MissingConfig(PathBuf),
    #[error("No .md/.txt files found.")]
    NoTargets,
    #[error("invalid pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("unable to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to parse {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("unable to render JSON report: {0}")]
    Json(#[from] serde_json::Error),
}

impl StyleError {
    /// 2 for usage problems (no config, no files, bad arguments), 1 otherwise.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            StyleError::MissingConfig(_)
            | StyleError::NoTargets
            | StyleError::Pattern(_)
            | StyleError::InvalidArgument(_) => 2,
            _ => 1,
        }
    }
}

/// Options for one linter run
#[derive(Debug, Clone, Default)]
pub struct LintOptions {
    /// Files, directories or glob patterns, relative to the workspace root; `.` when empty
    pub paths: Vec<String>,
    /// Pattern used inside directories instead of `**/*.md` and `**/*.txt`
    pub glob: Option<String>,
    pub excludes: Vec<String>,
    /// Apply whitespace fixes before checking
    pub fix: bool,
    pub json_out: Option<PathBuf>,
    pub overrides: Overrides,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StyleError + '_ {
    move |source| StyleError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn read_lossy(path: &Path) -> Result<String, StyleError> {
    let bytes = std::fs::read(path).map_err(io_error(path))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn autofix(path: &Path) -> Result<(), StyleError> {
    let original = read_lossy(path)?;
    let fixed = text::fix_whitespace(&original);
    if fixed != original {
        debug!("Fixed whitespace in {}", path.display());
        std::fs::write(path, fixed).map_err(io_error(path))?;
    }
    Ok(())
}

fn display_path(root: &Path, file: &Path) -> String {
    let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    file.strip_prefix(&root)
        .unwrap_or(file)
        .to_string_lossy()
        .into_owned()
}

/// Lint the files selected by `options`, print the Markdown report to `out`
/// and return the exit code: 1 when any ERROR issue was found, else 0.
///
/// # Errors
///
/// Returns `StyleError` when the config is missing or invalid, no files match,
/// or a file or report cannot be read or written.
pub fn run(root: &Path, options: &LintOptions, out: &mut dyn Write) -> Result<i32, StyleError> {
    let config = StyleConfig::load(root)?;
    let settings = Settings::resolve(&config.lint, &options.overrides);
    let banned = config.banned_phrases();
    debug!("Lint settings: {settings:?}, {} banned phrases", banned.len());

    let files = targets::collect(
        root,
        &options.paths,
        options.glob.as_deref(),
        &options.excludes,
    )?;
    if files.is_empty() {
        return Err(StyleError::NoTargets);
    }
    info!("Checking {} file(s)", files.len());

    let mut results = Vec::with_capacity(files.len());
    for file in &files {
        if options.fix {
            autofix(file)?;
        }
        let text = read_lossy(file)?;
        let (issues, term_coverage) = rules::check_text(&text, &banned, &settings);
        results.push(FileReport {
            file: display_path(root, file),
            issues,
            term_coverage,
        });
    }

    let (markdown, errors) = report::render_markdown(&results);
    let stdout_err = |source| StyleError::Io {
        path: PathBuf::from("<stdout>"),
        source,
    };
    writeln!(out, "{markdown}").map_err(stdout_err)?;

    if let Some(json_out) = &options.json_out {
        let path = root.join(json_out);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error(parent))?;
        }
        std::fs::write(&path, report::render_json(&results)?).map_err(io_error(&path))?;
        info!("Wrote JSON report to {}", path.display());
    }

    Ok(i32::from(errors > 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const STYLE: &str = "lint:\n  target_sentence_len: [1, 40]\nforbidden:\n  клише:\n    - в современном мире\n";

    fn workspace(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("config")).unwrap();
        fs::write(dir.path().join(STYLE_YAML), STYLE).unwrap();
        for (rel, body) in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }
        dir
    }

    #[test]
    fn test_banned_phrase_fails_run() {
        let dir = workspace(&[
            ("drafts/ch01.md", "В современном мире агенты пишут книги.\n"),
            ("drafts/ch02.md", "Агент пишет главу.\n"),
        ]);
        let mut out = Vec::new();
        let code = run(dir.path(), &LintOptions::default(), &mut out).unwrap();
        assert_eq!(code, 1);
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("## drafts/ch01.md\n- **ERROR** (para 1): Banned phrase: 'в современном мире'"));
        assert!(printed.contains("## drafts/ch02.md"));
    }

    #[test]
    fn test_clean_run_writes_json() {
        let dir = workspace(&[("drafts/ch01.md", "Агент пишет главу.\n")]);
        let options = LintOptions {
            paths: vec!["drafts/**/*.md".to_string()],
            json_out: Some(PathBuf::from("build/report/style.json")),
            ..Default::default()
        };
        let code = run(dir.path(), &options, &mut Vec::new()).unwrap();
        assert_eq!(code, 0);

        let json: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join("build/report/style.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(json["results"][0]["file"], "drafts/ch01.md");
        assert_eq!(json["results"][0]["term_coverage"]["агент"], true);
    }

    #[test]
    fn test_fix_normalizes_whitespace() {
        let dir = workspace(&[("notes.txt", "Агент пишет.   \n\n\n\nРедактор правит.\t\n")]);
        let options = LintOptions {
            fix: true,
            ..Default::default()
        };
        run(dir.path(), &options, &mut Vec::new()).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("notes.txt")).unwrap(),
            "Агент пишет.\n\nРедактор правит.\n"
        );
    }

    #[test]
    fn test_usage_errors_exit_two() {
        let empty = tempfile::tempdir().unwrap();
        let err = run(empty.path(), &LintOptions::default(), &mut Vec::new()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().starts_with("Missing "));

        let dir = workspace(&[]);
        let err = run(dir.path(), &LintOptions::default(), &mut Vec::new()).unwrap_err();
        assert!(matches!(err, StyleError::NoTargets));
        assert_eq!(err.exit_code(), 2);
    }
}
