use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw ranked record from the retrieval backend.
///
/// Notes:
/// - The pipeline only reads these; it never mutates or re-ranks them.
/// - `metadata` keys are not fixed in advance. The only keys interpreted here
///   are the tier markers (`type`) and the positional-anchor schemas
///   (`start_sec`/`end_sec`, `page`, `slide`); everything else passes through.
/// - `BTreeMap` keeps metadata iteration deterministic wherever it leaks into
///   rendered output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalResult {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub source_uri: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl RetrievalResult {
    /// Display title, falling back to the metadata `title` field.
    pub fn display_title(&self) -> String {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| str_field(&self.metadata, "title"))
            .unwrap_or("Unknown Document")
            .to_string()
    }

    /// Body text, trying the record field first, then the metadata fields the
    /// backend is known to use.
    pub fn body_text(&self) -> String {
        self.text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| str_field(&self.metadata, "text"))
            .or_else(|| str_field(&self.metadata, "text_original"))
            .unwrap_or("")
            .to_string()
    }

    /// Source URI, falling back to the metadata `source_uri` field.
    pub fn source_uri_value(&self) -> Option<String> {
        self.source_uri
            .clone()
            .or_else(|| str_field(&self.metadata, "source_uri").map(|s| s.to_string()))
    }

    /// Resolve the source reference for a passage, trying multiple locations:
    /// an explicit `source_id` metadata field, then well-known URI shapes
    /// (`youtube://<id>`, `gs://bucket/name.ext`), then the record id.
    pub fn source_ref(&self) -> String {
        if let Some(sid) = str_field(&self.metadata, "source_id") {
            if !sid.trim().is_empty() {
                return sid.to_string();
            }
        }

        let uri = self.source_uri_value().unwrap_or_default();
        if uri.contains("youtube://") {
            let tail = uri.rsplit("youtube://").next().unwrap_or("");
            let id = tail.split('/').next().unwrap_or("");
            if !id.is_empty() {
                return id.to_string();
            }
        }
        if uri.contains("gs://") {
            let name = uri.rsplit('/').next().unwrap_or("");
            let stem = name.split('.').next().unwrap_or("");
            if !stem.is_empty() {
                return stem.to_string();
            }
        }

        if self.id.trim().is_empty() {
            "unknown".to_string()
        } else {
            self.id.clone()
        }
    }
}

/// The two result tiers: document-level summaries and passage-level chunks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Summary,
    Chunk,
}

/// Citation label assigned during prompt construction: `S<n>` for summaries,
/// `C<n>` for chunks. Indices are dense, 1-based, and follow input order; the
/// two tiers count independently. Once assigned, a label is never renumbered —
/// the label shown in the reference list is exactly the label the generated
/// text may contain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct CitationLabel {
    pub tier: Tier,
    pub index: u32,
}

impl CitationLabel {
    pub fn new(tier: Tier, index: u32) -> Self {
        Self { tier, index }
    }
}

impl fmt::Display for CitationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.tier {
            Tier::Summary => 'S',
            Tier::Chunk => 'C',
        };
        write!(f, "{}{}", prefix, self.index)
    }
}

/// Record-scoped problem that must not abort a batch. Carried in results so
/// callers can act on it (which record, which field); nothing is silently
/// swallowed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordWarning {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl RecordWarning {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// String metadata field, `None` when absent or not a string.
pub fn str_field<'a>(metadata: &'a BTreeMap<String, Value>, key: &str) -> Option<&'a str> {
    metadata.get(key).and_then(Value::as_str)
}

/// Numeric metadata field. Accepts JSON numbers and numeric strings (the
/// retrieval backend returns stringly-typed fields for some sources).
/// Non-numeric values are treated as absent, never as an error.
pub fn num_field(metadata: &BTreeMap<String, Value>, key: &str) -> Option<f64> {
    let v = match metadata.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    v.filter(|x| x.is_finite())
}
