//! `config/style.yaml` and the effective lint settings

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::style::StyleError;
use crate::style::text::normalize;

/// Location of the style config, relative to the workspace root
pub const STYLE_YAML: &str = "config/style.yaml";

#[derive(Debug, Default, Deserialize)]
pub struct StyleConfig {
    #[serde(default)]
    pub lint: LintSection,
    #[serde(default)]
    pub forbidden: Forbidden,
}

#[derive(Debug, Default, Deserialize)]
pub struct LintSection {
    pub max_sentence_len: Option<usize>,
    pub target_sentence_len: Option<(usize, usize)>,
    pub max_paragraph_sentences: Option<usize>,
    pub passive_voice_allowed: Option<bool>,
    pub require_metrics_for_claims: Option<bool>,
    #[serde(default)]
    pub banned_phrases: Vec<String>,
}

/// Forbidden wording; the Russian keys are the canonical ones.
#[derive(Debug, Default, Deserialize)]
pub struct Forbidden {
    #[serde(default, rename = "клише", alias = "cliches")]
    pub cliches: Vec<String>,
    #[serde(default, rename = "лексика", alias = "vocabulary")]
    pub vocabulary: Vec<PhraseEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PhraseEntry {
    One(String),
    Many(Vec<String>),
    Other(serde_yaml::Value),
}

impl PhraseEntry {
    fn phrases(&self) -> &[String] {
        match self {
            PhraseEntry::One(phrase) => std::slice::from_ref(phrase),
            PhraseEntry::Many(phrases) => phrases,
            PhraseEntry::Other(_) => &[],
        }
    }
}

/// Command-line overrides of the `lint` section
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub max_sentence_len: Option<usize>,
    pub target_len: Option<(usize, usize)>,
    pub max_paragraph_sentences: Option<usize>,
    pub passive_allowed: bool,
    pub require_metrics: Option<bool>,
}

/// Effective thresholds for one lint run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub max_sentence_len: usize,
    pub target_len: (usize, usize),
    pub max_paragraph_sentences: usize,
    pub passive_allowed: bool,
    pub require_metrics: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            max_sentence_len: 22,
            target_len: (8, 16),
            max_paragraph_sentences: 5,
            passive_allowed: false,
            require_metrics: true,
        }
    }
}

impl Settings {
    #[must_use]
    pub fn resolve(lint: &LintSection, overrides: &Overrides) -> Settings {
        let defaults = Settings::default();
        Settings {
            max_sentence_len: overrides
                .max_sentence_len
                .or(lint.max_sentence_len)
                .unwrap_or(defaults.max_sentence_len),
            target_len: overrides
                .target_len
                .or(lint.target_sentence_len)
                .unwrap_or(defaults.target_len),
            max_paragraph_sentences: overrides
                .max_paragraph_sentences
                .or(lint.max_paragraph_sentences)
                .unwrap_or(defaults.max_paragraph_sentences),
            passive_allowed: overrides.passive_allowed
                || lint.passive_voice_allowed.unwrap_or(defaults.passive_allowed),
            require_metrics: overrides
                .require_metrics
                .or(lint.require_metrics_for_claims)
                .unwrap_or(defaults.require_metrics),
        }
    }
}

/// Parse a `--target-len A,B` value.
///
/// # Errors
///
/// Returns `StyleError::InvalidArgument` unless the value is two comma-separated integers.
pub fn parse_target_len(value: &str) -> Result<(usize, usize), StyleError> {
    let invalid = || StyleError::InvalidArgument(format!("--target-len expects A,B, got `{value}`"));
    let (lo, hi) = value.split_once(',').ok_or_else(invalid)?;
    let lo = lo.trim().parse().map_err(|_| invalid())?;
    let hi = hi.trim().parse().map_err(|_| invalid())?;
    Ok((lo, hi))
}

impl StyleConfig {
    /// Load `config/style.yaml` under `root`.
    ///
    /// # Errors
    ///
    /// Returns `StyleError::MissingConfig` if the file does not exist and
    /// `StyleError::Config` if it is not valid YAML.
    pub fn load(root: &Path) -> Result<StyleConfig, StyleError> {
        let path = root.join(STYLE_YAML);
        if !path.is_file() {
            return Err(StyleError::MissingConfig(path));
        }
        let text = std::fs::read_to_string(&path).map_err(|source| StyleError::Io {
            path: path.clone(),
            source,
        })?;
        if text.trim().is_empty() {
            return Ok(StyleConfig::default());
        }
        serde_yaml::from_str(&text).map_err(|source| StyleError::Config { path, source })
    }

    /// Every banned phrase from `lint` and `forbidden`, de-duplicated by normalized form.
    #[must_use]
    pub fn banned_phrases(&self) -> Vec<String> {
        let vocabulary = self
            .forbidden
            .vocabulary
            .iter()
            .flat_map(PhraseEntry::phrases);

        let mut seen = HashSet::new();
        self.lint
            .banned_phrases
            .iter()
            .chain(&self.forbidden.cliches)
            .chain(vocabulary)
            .filter(|phrase| {
                let key = normalize(phrase);
                !key.is_empty() && seen.insert(key)
            })
            .cloned()
            .collect()
    }
}
