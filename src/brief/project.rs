//! Schema of `config/project.yaml`

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::brief::budget::MIN_TARGET_PAGES;

/// Export formats a project may request
pub const KNOWN_OUTPUTS: [&str; 5] = ["DOCX", "PDF", "EPUB", "HTML", "MD"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub topic: String,
    pub positioning: Positioning,
    pub audience: Audience,
    pub scope: Scope,
    pub reader_questions: Vec<String>,
    pub objectives: Vec<String>,
    pub structure_outline: Vec<OutlinePart>,
    pub outputs: Vec<String>,
    pub acceptance_criteria: AcceptanceCriteria,
    pub risks_assumptions: RisksAssumptions,
    pub workflow_notes: WorkflowNotes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Positioning {
    pub for_whom: String,
    pub problem_jobs: Vec<String>,
    pub unique_angle: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Audience {
    pub primary: String,
    #[serde(default)]
    pub secondary: String,
    #[serde(default)]
    pub prerequisites: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    pub target_pages: u32,
    pub page_budget: Vec<PartBudget>,
    #[serde(default)]
    pub in_scope: Vec<String>,
    #[serde(default)]
    pub out_of_scope: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartBudget {
    pub part: String,
    pub pages: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlinePart {
    pub part: String,
    pub chapters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptanceCriteria {
    pub readability: Readability,
    pub structure: StructureCriteria,
    pub factuality: Factuality,
    pub applicability: Applicability,
    pub production: Production,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Readability {
    pub max_sentence_avg: u32,
    pub passive_voice_max: u32,
    pub simple_words_min: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureCriteria {
    pub chapter_len_variance_max: u32,
    pub each_chapter_has: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factuality {
    pub claim_evidence_coverage_min: u32,
    pub zero_critical_errors_sample: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Applicability {
    pub exercises_share_min: u32,
    pub case_studies_min: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Production {
    pub styles_validated: bool,
    pub export_success: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RisksAssumptions {
    pub risks: Vec<String>,
    pub mitigations: Vec<String>,
    pub assumptions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNotes {
    pub sources_policy: String,
    pub glossary_policy: String,
}

/// Every rule a project config broke
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<String>);

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, problem) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  - {problem}")?;
        }
        Ok(())
    }
}

fn check_percent(problems: &mut Vec<String>, field: &str, value: u32) {
    if value > 100 {
        problems.push(format!("{field}: {value} is not a percentage"));
    }
}

impl ProjectConfig {
    /// Check the invariants the rest of the pipeline relies on.
    ///
    /// # Errors
    ///
    /// Returns every violated rule at once.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut problems = Vec::new();

        if self.topic.trim().is_empty() {
            problems.push("topic: must not be empty".to_string());
        }
        if self.audience.primary.trim().is_empty() {
            problems.push("audience.primary: must not be empty".to_string());
        }

        let scope = &self.scope;
        if scope.target_pages < MIN_TARGET_PAGES {
            problems.push(format!(
                "scope.target_pages: {} is below the minimum of {MIN_TARGET_PAGES}",
                scope.target_pages
            ));
        }
        if scope.page_budget.is_empty() {
            problems.push("scope.page_budget: must not be empty".to_string());
        }
        for (i, part) in scope.page_budget.iter().enumerate() {
            if part.pages == 0 {
                problems.push(format!(
                    "scope.page_budget[{i}].pages: part `{}` has no pages",
                    part.part
                ));
            }
        }
        let budgeted: u64 = scope.page_budget.iter().map(|p| u64::from(p.pages)).sum();
        if budgeted != u64::from(scope.target_pages) {
            problems.push(format!(
                "scope.page_budget: parts sum to {budgeted}, expected {}",
                scope.target_pages
            ));
        }

        if self.outputs.is_empty() {
            problems.push("outputs: at least one format is required".to_string());
        }
        for output in &self.outputs {
            if !KNOWN_OUTPUTS.contains(&output.as_str()) {
                problems.push(format!(
                    "outputs: unknown format `{output}` (expected one of {})",
                    KNOWN_OUTPUTS.join(", ")
                ));
            }
        }

        let criteria = &self.acceptance_criteria;
        check_percent(
            &mut problems,
            "acceptance_criteria.readability.passive_voice_max",
            criteria.readability.passive_voice_max,
        );
        check_percent(
            &mut problems,
            "acceptance_criteria.readability.simple_words_min",
            criteria.readability.simple_words_min,
        );
        check_percent(
            &mut problems,
            "acceptance_criteria.factuality.claim_evidence_coverage_min",
            criteria.factuality.claim_evidence_coverage_min,
        );
        check_percent(
            &mut problems,
            "acceptance_criteria.applicability.exercises_share_min",
            criteria.applicability.exercises_share_min,
        );

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(problems))
        }
    }
}
