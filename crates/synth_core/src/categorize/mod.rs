use serde::{Deserialize, Serialize};

use crate::domain::{str_field, RecordWarning, RetrievalResult};

/// Metadata `type` value marking a document-level summary.
pub const SUMMARY_TYPE_MARKER: &str = "document_summary";

/// Reserved id prefix marking a document-level summary when the `type` field
/// is absent.
pub const SUMMARY_ID_PREFIX: &str = "summary_";

/// Output of tier assignment. Relative order within each tier matches the
/// input order, and `total` counts the records that were categorized
/// (malformed records are excluded and recorded in `warnings`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategorizedResults {
    pub summaries: Vec<RetrievalResult>,
    pub chunks: Vec<RetrievalResult>,
    pub total: u32,
    pub warnings: Vec<RecordWarning>,
}

fn is_summary(result: &RetrievalResult) -> bool {
    // The `type` field takes priority; the id prefix is only consulted when
    // the field is absent (or not a string). A record failing this test is a
    // chunk, never an error.
    match str_field(&result.metadata, "type") {
        Some(doc_type) => doc_type == SUMMARY_TYPE_MARKER,
        None => result.id.starts_with(SUMMARY_ID_PREFIX),
    }
}

/// Split an ordered result list into the summary tier and the chunk tier.
///
/// Tier assignment is a pure function of a record's identifier and metadata.
/// A record with a blank identifier is excluded with a `RESULT_MISSING_ID`
/// warning; the rest of the batch proceeds.
pub fn categorize_results(results: &[RetrievalResult]) -> CategorizedResults {
    let mut summaries = Vec::new();
    let mut chunks = Vec::new();
    let mut warnings = Vec::new();

    for (position, result) in results.iter().enumerate() {
        if result.id.trim().is_empty() {
            warnings.push(
                RecordWarning::new("RESULT_MISSING_ID", "Retrieval result has no identifier")
                    .with_details(format!(
                        "position={position}; title={}",
                        result.display_title()
                    )),
            );
            continue;
        }

        if is_summary(result) {
            summaries.push(result.clone());
        } else {
            chunks.push(result.clone());
        }
    }

    let total = (summaries.len() + chunks.len()) as u32;
    CategorizedResults {
        summaries,
        chunks,
        total,
        warnings,
    }
}
