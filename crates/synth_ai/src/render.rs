use crate::prompt::{excerpt_chars, join_meta_fields};
use crate::synthesize::SynthesisResult;

const BAR: &str =
    "================================================================================";

/// Reference-list excerpts are shorter than the prompt's chunk text cap.
const EXCERPT_MAX_CHARS: usize = 200;

/// Render a synthesis result as plain text: the answer verbatim, then the
/// labeled source lists, then a model/count footer.
///
/// Labels come straight from the result; re-sorting, re-numbering, or
/// filtering here would silently invalidate citations already embedded in the
/// generated text. Output is deterministic and snapshot-testable.
pub fn render_final_response(result: &SynthesisResult) -> String {
    let mut out = String::new();

    out.push_str(BAR);
    out.push('\n');
    out.push_str("ANSWER\n");
    out.push_str(BAR);
    out.push('\n');
    out.push('\n');
    out.push_str(&result.answer);
    out.push('\n');
    out.push('\n');
    out.push_str(BAR);
    out.push('\n');
    out.push_str("SOURCES\n");
    out.push_str(BAR);
    out.push('\n');

    if !result.summaries.is_empty() {
        out.push_str("\nDOCUMENT SUMMARIES:\n");
        for s in &result.summaries {
            out.push_str(&format!("\n[{}] {}\n", s.label, s.title));
            if !s.fields.is_empty() {
                out.push_str(&format!("     {}\n", join_meta_fields(&s.fields)));
            }
            if let Some(uri) = s.source_uri.as_deref() {
                out.push_str(&format!("     URL: {uri}\n"));
            }
        }
    }

    if !result.chunks.is_empty() {
        out.push_str("\nSPECIFIC REFERENCES:\n");
        for c in &result.chunks {
            match c.anchor {
                Some(a) => out.push_str(&format!("\n[{}] {} {}\n", c.label, c.source_ref, a)),
                None => out.push_str(&format!("\n[{}] {}\n", c.label, c.source_ref)),
            }
            out.push_str(&format!(
                "     {}\n",
                excerpt_chars(&c.text, EXCERPT_MAX_CHARS)
            ));
        }
    }

    out.push('\n');
    out.push_str(BAR);
    out.push('\n');
    out.push_str(&format!("Model: {}\n", result.model));
    out.push_str(&format!(
        "Results: {} ({} summaries, {} chunks)\n",
        result.total_results,
        result.summaries.len(),
        result.chunks.len()
    ));
    out.push_str(BAR);
    out.push('\n');

    out
}
