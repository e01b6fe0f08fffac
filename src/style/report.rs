use std::fmt::Write as _;

use serde::ser::{Serialize, SerializeMap, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    ParagraphLen,
    Banned,
    SentenceLen,
    SentenceTarget,
    Passive,
    VagueNoMetric,
    Terminology,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Issue {
    pub level: Level,
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub para: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent: Option<usize>,
    pub msg: String,
}

impl Issue {
    #[must_use]
    pub fn paragraph(level: Level, kind: IssueKind, para: usize, msg: String) -> Issue {
        Issue {
            level,
            kind,
            para,
            sent: None,
            msg,
        }
    }

    #[must_use]
    pub fn sentence(level: Level, kind: IssueKind, para: usize, sent: usize, msg: String) -> Issue {
        Issue {
            level,
            kind,
            para,
            sent: Some(sent),
            msg,
        }
    }
}

/// Glossary term presence, kept in glossary order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermCoverage(pub Vec<(String, bool)>);

impl TermCoverage {
    pub fn missing(&self) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .filter(|(_, present)| !present)
            .map(|(term, _)| term.as_str())
    }
}

impl Serialize for TermCoverage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (term, present) in &self.0 {
            map.serialize_entry(term, present)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct FileReport {
    pub file: String,
    pub issues: Vec<Issue>,
    pub term_coverage: TermCoverage,
}

impl FileReport {
    #[must_use]
    pub fn errors(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.level == Level::Error)
            .count()
    }
}

#[derive(serde::Serialize)]
struct JsonReport<'a> {
    results: &'a [FileReport],
}

/// Render the Markdown report and count ERROR issues.
#[must_use]
pub fn render_markdown(results: &[FileReport]) -> (String, usize) {
    let mut out = String::from("# Style Lint Report\n");
    let mut errors = 0;
    for report in results {
        let _ = write!(out, "\n## {}\n", report.file);
        if report.issues.is_empty() {
            out.push_str("✔ No issues.\n");
            continue;
        }
        errors += report.errors();
        for issue in &report.issues {
            let _ = write!(out, "- **{}** (para {}", issue.level.as_str(), issue.para);
            if let Some(sent) = issue.sent {
                let _ = write!(out, ", sent {sent}");
            }
            let _ = writeln!(out, "): {}", issue.msg);
        }
        let missing: Vec<&str> = report.term_coverage.missing().collect();
        if !missing.is_empty() {
            let _ = write!(out, "\n_Hint_: glossary terms not used: {}\n", missing.join(", "));
        }
    }
    (out, errors)
}

/// Pretty JSON document `{"results": [...]}`.
///
/// # Errors
///
/// Returns `serde_json::Error` if serialization fails.
pub fn render_json(results: &[FileReport]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&JsonReport { results })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<FileReport> {
        vec![
            FileReport {
                file: "drafts/ch01.md".to_string(),
                issues: vec![
                    Issue::paragraph(
                        Level::Error,
                        IssueKind::Banned,
                        1,
                        "Banned phrase: 'в современном мире'".to_string(),
                    ),
                    Issue::sentence(
                        Level::Info,
                        IssueKind::Terminology,
                        2,
                        1,
                        "Use the glossary term 'рутер'.".to_string(),
                    ),
                ],
                term_coverage: TermCoverage(vec![
                    ("агент".to_string(), true),
                    ("RAG".to_string(), false),
                ]),
            },
            FileReport {
                file: "drafts/ch02.md".to_string(),
                issues: vec![],
                term_coverage: TermCoverage(vec![("агент".to_string(), true)]),
            },
        ]
    }

    #[test]
    fn test_markdown_report() {
        let (text, errors) = render_markdown(&sample());
        assert_eq!(errors, 1);
        insta::assert_snapshot!(text, @r"
        # Style Lint Report

        ## drafts/ch01.md
        - **ERROR** (para 1): Banned phrase: 'в современном мире'
        - **INFO** (para 2, sent 1): Use the glossary term 'рутер'.

        _Hint_: glossary terms not used: RAG

        ## drafts/ch02.md
        ✔ No issues.
        ");
    }

    #[test]
    fn test_json_report_shape() {
        let json: serde_json::Value = serde_json::from_str(&render_json(&sample()).unwrap()).unwrap();
        let first = &json["results"][0];
        assert_eq!(first["file"], "drafts/ch01.md");
        assert_eq!(first["issues"][0]["level"], "ERROR");
        assert_eq!(first["issues"][0]["type"], "banned");
        assert!(first["issues"][0].get("sent").is_none());
        assert_eq!(first["issues"][1]["sent"], 1);
        assert_eq!(first["term_coverage"]["RAG"], false);
    }

    #[test]
    fn test_term_coverage_keeps_order() {
        let coverage = TermCoverage(vec![("b".to_string(), true), ("a".to_string(), false)]);
        assert_eq!(serde_json::to_string(&coverage).unwrap(), r#"{"b":true,"a":false}"#);
    }
}
