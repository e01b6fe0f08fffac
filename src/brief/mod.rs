//! Product-brief stage
//!
//! Turns a topic, an audience, a page count and a list of export formats into a
//! validated `config/project.yaml`, then prints the KPI table the brief commits to.

use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

pub mod budget;
pub mod content;
mod input;
pub mod project;
pub mod yaml;

pub use input::{BriefInput, BriefSource, DEFAULT_OUTPUTS};
use project::{ProjectConfig, ValidationErrors};

/// Location of the generated project config, relative to the workspace root
pub const PROJECT_YAML: &str = "config/project.yaml";

pub const KPI_TABLE: &str = "\
| Метрика | Цель/порог | Как меряем | Чек-пойнт |
|---|---|---|---|
| Читаемость | средняя длина ≤ 17 слов; пассив ≤ 8%; простые ≥ 75% | статический анализ текста | по завершении каждой части |
| Структура | разброс длины глав ≤ 20%; hook/objective/example/checkpoint в каждой | скрипт проверки оглавления + чек-лист | при слиянии в main |
| Фактичность | ≥ 80% утверждений со ссылками; 0 критических ошибок в n=30 | ручная выборка + линтер ссылок | перед релиз-кандидатом |
| Прикладность | ≥ 20% страниц с упражнениями; ≥ 6 кейсов | счётчик макета | конец Части III |
| Продакшн | Успешный экспорт DOCX/PDF/EPUB | CI-джоб экспортов | релиз |";

#[derive(Error, Debug)]
pub enum BriefError {
    #[error("provide either --json or all of --topic/--audience/--target-pages/--outputs")]
    MissingInput,
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    #[error("project.yaml validation failed:\n{0}")]
    Validation(ValidationErrors),
    #[error("unable to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("unable to render YAML: {0}")]
    Render(#[from] serde_yaml::Error),
    #[error("rendered YAML does not read back to the same project: {0}")]
    RoundTrip(String),
    #[error("unable to write report: {0}")]
    Output(#[source] std::io::Error),
}

impl BriefError {
    /// Process exit code for this failure: 2 for bad input, 3 for an invalid project.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            BriefError::MissingInput | BriefError::InvalidJson(_) => 2,
            BriefError::Validation(_) | BriefError::Parse { .. } => 3,
            _ => 1,
        }
    }
}

/// Generate, validate and write `config/project.yaml` under `root`, then print the KPI table to `out`.
///
/// # Errors
///
/// Returns `BriefError::InvalidJson` for a bad payload, `BriefError::Validation`
/// when the generated project breaks a rule, and `BriefError::Io` when the file
/// cannot be written.
pub fn run(root: &Path, source: &BriefSource, out: &mut dyn Write) -> Result<PathBuf, BriefError> {
    let input = match source {
        BriefSource::Flags(input) => input.clone().normalized(),
        BriefSource::Json(raw) => BriefInput::from_json(raw)?,
    };
    debug!("Generating brief for {input:?}");

    let config = content::deterministic(&input);
    config.validate().map_err(BriefError::Validation)?;

    let path = root.join(PROJECT_YAML);
    write_project(&config, &path)?;

    writeln!(out, "{KPI_TABLE}").map_err(BriefError::Output)?;
    writeln!(out, "\n[ok] wrote {PROJECT_YAML}").map_err(BriefError::Output)?;
    Ok(path)
}

/// Write `config` to `path`, creating parent directories. Nothing is written
/// unless the rendered text parses back to `config`.
///
/// # Errors
///
/// Returns `BriefError::RoundTrip` if the rendered YAML reads back differently
/// and `BriefError::Io` if the directory or file cannot be written.
pub fn write_project(config: &ProjectConfig, path: &Path) -> Result<(), BriefError> {
    let text = yaml::to_string(config)?;
    let parsed: ProjectConfig =
        serde_yaml::from_str(&text).map_err(|e| BriefError::RoundTrip(e.to_string()))?;
    if parsed != *config {
        return Err(BriefError::RoundTrip(format!("{parsed:?}")));
    }

    let io_err = |source| BriefError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, text).map_err(io_err)
}

/// Load and validate an existing project config.
///
/// # Errors
///
/// Returns `BriefError::Io` when the file cannot be read, `BriefError::Parse`
/// when it is not a project config and `BriefError::Validation` when it breaks a rule.
pub fn validate_file(path: &Path) -> Result<ProjectConfig, BriefError> {
    let text = std::fs::read_to_string(path).map_err(|source| BriefError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: ProjectConfig = serde_yaml::from_str(&text).map_err(|source| BriefError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate().map_err(BriefError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn flags(target_pages: u32) -> BriefSource {
        BriefSource::Flags(BriefInput {
            topic: "Пайплайн книги".to_string(),
            audience: "Инженеры".to_string(),
            target_pages,
            outputs: vec!["docx".to_string(), "pdf".to_string()],
        })
    }

    #[test]
    fn test_run_writes_project_and_kpi_table() {
        let dir = tempfile::tempdir().unwrap();
        let mut out = Vec::new();
        let path = run(dir.path(), &flags(160), &mut out).unwrap();
        assert_eq!(path, dir.path().join(PROJECT_YAML));

        let config = validate_file(&path).unwrap();
        assert_eq!(config.outputs, vec!["DOCX", "PDF"]);

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.starts_with("| Метрика |"));
        assert!(printed.ends_with("[ok] wrote config/project.yaml\n"));
    }

    #[test]
    fn test_invalid_project_exits_three() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(dir.path(), &flags(50), &mut Vec::new()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert!(!dir.path().join(PROJECT_YAML).exists());
    }

    #[test]
    fn test_invalid_json_exits_two() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(
            dir.path(),
            &BriefSource::Json("{oops".to_string()),
            &mut Vec::new(),
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().starts_with("invalid JSON:"));
    }

    #[test]
    fn test_topic_with_line_separator_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let source = BriefSource::Json(
            r#"{"topic":"Agents\u2028pipelines","audience":"Инженеры","target_pages":160}"#
                .to_string(),
        );
        let path = run(dir.path(), &source, &mut Vec::new()).unwrap();
        let config = validate_file(&path).unwrap();
        assert_eq!(config.topic, "Agents\u{2028}pipelines");
    }

    #[test]
    fn test_incomplete_project_exits_three() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PROJECT_YAML);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "topic: x\n").unwrap();
        let err = validate_file(&path).unwrap_err();
        assert!(matches!(err, BriefError::Parse { .. }), "{err:?}");
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_validate_file_reports_broken_budget() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PROJECT_YAML);
        let mut config = content::deterministic(&BriefInput {
            topic: "t".to_string(),
            audience: "a".to_string(),
            target_pages: 160,
            outputs: vec!["PDF".to_string()],
        });
        config.scope.target_pages = 170;
        write_project(&config, &path).unwrap();
        match validate_file(&path) {
            Err(BriefError::Validation(errors)) => {
                assert!(errors.0[0].contains("parts sum to 160, expected 170"));
            }
            other => panic!("Expected Validation, got: {other:?}"),
        }
    }
}
