use std::collections::BTreeSet;

use synth_core::domain::{CitationLabel, RecordWarning, Tier};

/// Parse the bracketed citation tokens `[S<n>]` / `[C<n>]` embedded in
/// generated answer text. Adjacent tokens are independent citations; anchor
/// tokens that may follow a label (`[Page 5]`, `[12:30-13:45]`) are not
/// labels and are ignored here.
///
/// Returns labels in first-occurrence order, de-duplicated.
pub fn extract_citation_labels(text: &str) -> Vec<CitationLabel> {
    let bytes = text.as_bytes();
    let mut out: Vec<CitationLabel> = Vec::new();
    let mut seen: BTreeSet<CitationLabel> = BTreeSet::new();
    let mut i = 0usize;

    while i < bytes.len() {
        if bytes[i] == b'[' && i + 2 < bytes.len() {
            let tier = match bytes[i + 1] {
                b'S' => Some(Tier::Summary),
                b'C' => Some(Tier::Chunk),
                _ => None,
            };
            if let Some(tier) = tier {
                let mut j = i + 2;
                while j < bytes.len() && bytes[j].is_ascii_digit() {
                    j += 1;
                }
                if j > i + 2 && j < bytes.len() && bytes[j] == b']' {
                    if let Ok(index) = text[i + 2..j].parse::<u32>() {
                        if index >= 1 {
                            let label = CitationLabel::new(tier, index);
                            if seen.insert(label) {
                                out.push(label);
                            }
                        }
                    }
                    i = j + 1;
                    continue;
                }
            }
        }
        i += 1;
    }

    out
}

/// Check cited labels against the assigned label ranges. Out-of-range labels
/// become warnings, never errors: the answer text already exists, and
/// rejecting or renumbering it now would invalidate the citations it embeds.
pub fn audit_citations(
    answer: &str,
    summary_count: usize,
    chunk_count: usize,
) -> Vec<RecordWarning> {
    let mut warnings = Vec::new();
    for label in extract_citation_labels(answer) {
        let available = match label.tier {
            Tier::Summary => summary_count,
            Tier::Chunk => chunk_count,
        };
        if label.index as usize > available {
            warnings.push(
                RecordWarning::new(
                    "CITATION_UNKNOWN_LABEL",
                    "Answer cites a label that was never assigned",
                )
                .with_details(format!(
                    "label={label}; summaries={summary_count}; chunks={chunk_count}"
                )),
            );
        }
    }
    warnings
}
