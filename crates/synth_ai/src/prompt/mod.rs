use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use synth_core::anchor::{anchor_for, Anchor};
use synth_core::categorize::CategorizedResults;
use synth_core::domain::{str_field, CitationLabel, Tier};

/// Summary text is capped in the prompt; the full text stays on the record.
pub const SUMMARY_TEXT_MAX_CHARS: usize = 500;
pub const CHUNK_TEXT_MAX_CHARS: usize = 300;

/// One present metadata field of a summary, rendered as `Name: value` in both
/// the prompt and the reference list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetaField {
    pub name: String,
    pub value: String,
}

impl MetaField {
    fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

/// Tier-1 record with its assigned label. Everything the reference list needs
/// is resolved here, so the formatter can never drift from the prompt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabeledSummary {
    pub label: CitationLabel,
    pub title: String,
    pub fields: Vec<MetaField>,
    pub text: String,
    pub source_uri: Option<String>,
}

/// Tier-2 record with its assigned label, resolved source reference, and
/// derived anchor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabeledChunk {
    pub label: CitationLabel,
    pub source_ref: String,
    pub anchor: Option<Anchor>,
    pub text: String,
}

/// Immutable prompt built once per request: a pure function of (question,
/// summaries, chunks, anchors, language). The fingerprint is the SHA-256 of
/// the prompt text, usable as a cache key downstream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SynthesisPrompt {
    pub text: String,
    pub fingerprint: String,
}

/// Document-level metadata fields that are actually present, in fixed order.
/// `speaker` shadows `author` when both exist.
pub fn summary_fields(metadata: &BTreeMap<String, Value>) -> Vec<MetaField> {
    let mut fields = Vec::new();
    if let Some(speaker) = str_field(metadata, "speaker") {
        fields.push(MetaField::new("Speaker", speaker));
    } else if let Some(author) = str_field(metadata, "author") {
        fields.push(MetaField::new("Author", author));
    }
    if let Some(org) = str_field(metadata, "organization") {
        fields.push(MetaField::new("Organization", org));
    }
    if let Some(date) = str_field(metadata, "date") {
        fields.push(MetaField::new("Date", date));
    }
    if let Some(tags) = tags_value(metadata) {
        fields.push(MetaField::new("Tags", &tags));
    }
    fields
}

fn tags_value(metadata: &BTreeMap<String, Value>) -> Option<String> {
    match metadata.get("tags")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Array(items) => {
            let tags: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            if tags.is_empty() {
                None
            } else {
                Some(tags.join(", "))
            }
        }
        _ => None,
    }
}

pub(crate) fn join_meta_fields(fields: &[MetaField]) -> String {
    fields
        .iter()
        .map(|f| format!("{}: {}", f.name, f.value))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Assign citation labels in input order: `S1..Sn` and `C1..Cm`, counted
/// independently per tier. Every categorized record receives exactly one
/// label; no index is skipped or reused.
pub fn label_results(categorized: &CategorizedResults) -> (Vec<LabeledSummary>, Vec<LabeledChunk>) {
    let summaries = categorized
        .summaries
        .iter()
        .enumerate()
        .map(|(i, r)| LabeledSummary {
            label: CitationLabel::new(Tier::Summary, i as u32 + 1),
            title: r.display_title(),
            fields: summary_fields(&r.metadata),
            text: r.body_text(),
            source_uri: r.source_uri_value(),
        })
        .collect();

    let chunks = categorized
        .chunks
        .iter()
        .enumerate()
        .map(|(i, r)| LabeledChunk {
            label: CitationLabel::new(Tier::Chunk, i as u32 + 1),
            source_ref: r.source_ref(),
            anchor: anchor_for(&r.metadata),
            text: r.body_text(),
        })
        .collect();

    (summaries, chunks)
}

const PROMPT_HEADER: &str = "\
You are an expert research assistant analyzing documents from a curated collection.
Your task is to provide a direct, comprehensive answer based on two tiers of information:
- Tier 1: Document summaries (high-level context with speaker/author metadata)
- Tier 2: Specific chunks with precise anchors (detailed evidence)

IMPORTANT INSTRUCTIONS:
- If the question asks about a specific person's views and the summaries list that
  person as speaker/author, use their content.
- Be direct in attributing statements when the metadata clearly identifies the speaker.

CITATION RULES:
- Always cite sources using [S1], [S2] for summaries and [C1], [C2] for chunks
- Include anchors like [Page 5] or [12:30-13:45] when citing chunks
- Prefer citing specific chunks over summaries when available
- Multiple citations are encouraged: [C1][C2]
";

const PROMPT_FOOTER: &str = "\
Structure your answer as follows:
1. Direct answer to the question (2-3 sentences)
2. Supporting evidence with citations
3. Additional context if relevant

IMPORTANT:
- Cite every factual claim
- Use [S1], [S2] for summaries and [C1], [C2] for chunks
- When citing chunks, mention the anchor: 'According to the analysis [C1][Page 5]...'
- For video/audio: 'As stated in the interview [C2][12:30-13:45]...'
- Be specific and precise
- If the sources don't fully answer the question, acknowledge the gaps

Now provide your synthesized answer:
";

/// Assemble the generation prompt. Identical inputs in identical order yield
/// byte-identical text: no wall-clock content, no randomness, and every map
/// that reaches this point iterates deterministically.
pub fn build_synthesis_prompt(
    question: &str,
    summaries: &[LabeledSummary],
    chunks: &[LabeledChunk],
    language: &str,
) -> SynthesisPrompt {
    let mut out = String::new();
    out.push_str(PROMPT_HEADER);

    if !summaries.is_empty() {
        out.push_str("\n=== TIER 1: DOCUMENT SUMMARIES ===\n");
        for s in summaries {
            // Entries with neither text nor metadata give the model nothing to
            // cite; skipping them leaves the label counters untouched.
            if s.text.is_empty() && s.fields.is_empty() {
                continue;
            }
            out.push_str(&format!("\n[{}] {}\n", s.label, s.title));
            if !s.fields.is_empty() {
                out.push_str(&format!("   {}\n", join_meta_fields(&s.fields)));
            }
            if !s.text.is_empty() {
                out.push_str(&format!(
                    "   Summary: {}\n",
                    excerpt_chars(&s.text, SUMMARY_TEXT_MAX_CHARS)
                ));
            }
        }
    }

    if !chunks.is_empty() {
        out.push_str("\n=== TIER 2: SPECIFIC CHUNKS (WITH ANCHORS) ===\n");
        for c in chunks {
            match c.anchor {
                Some(a) => out.push_str(&format!("\n[{}] {} {}\n", c.label, c.source_ref, a)),
                None => out.push_str(&format!("\n[{}] {}\n", c.label, c.source_ref)),
            }
            out.push_str(&format!(
                "   {}\n",
                excerpt_chars(&c.text, CHUNK_TEXT_MAX_CHARS)
            ));
        }
    }

    if summaries.is_empty() && chunks.is_empty() {
        out.push_str("\n=== NO RELEVANT DOCUMENTS FOUND ===\n");
    }

    out.push_str("\n=== QUESTION ===\n");
    out.push_str(question);
    out.push('\n');

    out.push_str("\n=== INSTRUCTIONS ===\n");
    let language_name = if language == "en" { "English" } else { language };
    out.push_str(&format!("Answer in {language_name}.\n"));
    out.push_str(PROMPT_FOOTER);

    let fingerprint = sha256_hex(out.as_bytes());
    SynthesisPrompt {
        text: out,
        fingerprint,
    }
}

/// Char-boundary-safe truncation with a trailing ellipsis.
pub(crate) fn excerpt_chars(text: &str, max_chars: usize) -> String {
    let t = text.trim();
    if t.chars().count() <= max_chars {
        return t.to_string();
    }
    let mut s: String = t.chars().take(max_chars).collect();
    s.push_str("...");
    s
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(digest)
}
