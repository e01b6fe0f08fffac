use serde::Deserialize;

use crate::brief::BriefError;

/// Formats requested when a payload does not name any
pub const DEFAULT_OUTPUTS: [&str; 3] = ["DOCX", "PDF", "EPUB"];

/// Everything the product-brief stage needs from the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BriefInput {
    pub topic: String,
    pub audience: String,
    pub target_pages: u32,
    pub outputs: Vec<String>,
}

/// Where the brief input comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BriefSource {
    Flags(BriefInput),
    /// Raw JSON payload, parsed by the stage itself
    Json(String),
}

impl BriefSource {
    /// Choose the JSON payload when one is given, otherwise require every flag.
    /// Blank text and a page count of 0 count as missing.
    ///
    /// # Errors
    ///
    /// Returns `BriefError::MissingInput` when neither a payload nor a complete
    /// set of flags is present.
    pub fn from_parts(
        json: Option<String>,
        topic: Option<String>,
        audience: Option<String>,
        target_pages: Option<u32>,
        outputs: Option<String>,
    ) -> Result<BriefSource, BriefError> {
        if let Some(json) = json {
            return Ok(BriefSource::Json(json));
        }
        let present = |s: Option<String>| s.filter(|s| !s.trim().is_empty());
        match (
            present(topic),
            present(audience),
            target_pages.filter(|n| *n > 0),
            present(outputs),
        ) {
            (Some(topic), Some(audience), Some(target_pages), Some(outputs)) => {
                Ok(BriefSource::Flags(BriefInput {
                    topic,
                    audience,
                    target_pages,
                    outputs: outputs.split(',').map(str::to_string).collect(),
                }))
            }
            _ => Err(BriefError::MissingInput),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PageCount {
    Int(i64),
    Float(f64),
    Text(String),
}

impl PageCount {
    #[allow(clippy::cast_possible_truncation)]
    fn to_pages(&self) -> Result<u32, BriefError> {
        let pages = match self {
            PageCount::Int(n) => *n,
            PageCount::Float(f) if f.fract() == 0.0 => *f as i64,
            PageCount::Text(s) => s.trim().parse::<i64>().map_err(|_| {
                BriefError::InvalidJson(format!("target_pages `{s}` is not an integer"))
            })?,
            PageCount::Float(f) => {
                return Err(BriefError::InvalidJson(format!(
                    "target_pages `{f}` is not an integer"
                )));
            }
        };
        u32::try_from(pages)
            .map_err(|_| BriefError::InvalidJson(format!("target_pages `{pages}` is out of range")))
    }
}

#[derive(Deserialize)]
struct Payload {
    topic: String,
    audience: String,
    target_pages: PageCount,
    outputs: Option<Vec<String>>,
}

fn normalize_outputs(outputs: impl IntoIterator<Item = String>) -> Vec<String> {
    outputs
        .into_iter()
        .map(|o| o.trim().to_uppercase())
        .filter(|o| !o.is_empty())
        .collect()
}

impl BriefInput {
    /// Parse a raw JSON payload such as
    /// `{"topic":"…","audience":"…","target_pages":160,"outputs":["DOCX","PDF"]}`.
    ///
    /// # Errors
    ///
    /// Returns `BriefError::InvalidJson` for malformed JSON, missing keys or a
    /// page count that is not a non-negative integer.
    pub fn from_json(raw: &str) -> Result<BriefInput, BriefError> {
        let payload: Payload =
            serde_json::from_str(raw).map_err(|e| BriefError::InvalidJson(e.to_string()))?;
        let outputs = payload.outputs.map_or_else(
            || DEFAULT_OUTPUTS.iter().map(|o| (*o).to_string()).collect(),
            normalize_outputs,
        );
        Ok(BriefInput {
            topic: payload.topic.trim().to_string(),
            audience: payload.audience.trim().to_string(),
            target_pages: payload.target_pages.to_pages()?,
            outputs,
        })
    }

    /// Trim text fields and upper-case output formats.
    #[must_use]
    pub fn normalized(self) -> BriefInput {
        BriefInput {
            topic: self.topic.trim().to_string(),
            audience: self.audience.trim().to_string(),
            target_pages: self.target_pages,
            outputs: normalize_outputs(self.outputs),
        }
    }
}
