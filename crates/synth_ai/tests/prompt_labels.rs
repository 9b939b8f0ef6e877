use std::collections::BTreeMap;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use synth_ai::prompt::{build_synthesis_prompt, label_results};
use synth_core::categorize::categorize_results;
use synth_core::domain::RetrievalResult;

fn record(id: &str, text: &str, metadata: Value) -> RetrievalResult {
    let metadata: BTreeMap<String, Value> =
        serde_json::from_value(metadata).expect("metadata map");
    RetrievalResult {
        id: id.to_string(),
        title: None,
        text: Some(text.to_string()),
        source_uri: None,
        metadata,
    }
}

fn interleaved_results() -> Vec<RetrievalResult> {
    // Merged ranking interleaves the tiers; labels must not.
    vec![
        record("chunk_a", "first passage", json!({"source_id": "doc_a", "page": 2})),
        record(
            "summary_a",
            "summary of doc a",
            json!({"type": "document_summary", "author": "A. Author"}),
        ),
        record(
            "chunk_b",
            "second passage",
            json!({"source_id": "doc_a", "start_sec": 30.0, "end_sec": 45.0}),
        ),
        record(
            "summary_b",
            "summary of doc b",
            json!({"type": "document_summary", "speaker": "B. Speaker"}),
        ),
        record("chunk_c", "third passage", json!({"source_id": "doc_b"})),
    ]
}

#[test]
fn labels_are_dense_and_tier_independent() {
    let cat = categorize_results(&interleaved_results());
    let (summaries, chunks) = label_results(&cat);

    let summary_labels: Vec<String> = summaries.iter().map(|s| s.label.to_string()).collect();
    let chunk_labels: Vec<String> = chunks.iter().map(|c| c.label.to_string()).collect();
    assert_eq!(summary_labels, vec!["S1", "S2"]);
    assert_eq!(chunk_labels, vec!["C1", "C2", "C3"]);

    // Anchors are derived per chunk during labeling.
    assert_eq!(chunks[0].anchor.map(|a| a.to_string()), Some("[Page 2]".to_string()));
    assert_eq!(
        chunks[1].anchor.map(|a| a.to_string()),
        Some("[0:30-0:45]".to_string())
    );
    assert_eq!(chunks[2].anchor, None);
}

#[test]
fn prompt_is_byte_identical_on_repeat() {
    let cat = categorize_results(&interleaved_results());
    let (summaries, chunks) = label_results(&cat);

    let a = build_synthesis_prompt("What changed?", &summaries, &chunks, "en");
    let b = build_synthesis_prompt("What changed?", &summaries, &chunks, "en");
    assert_eq!(a.text, b.text);
    assert_eq!(a.fingerprint, b.fingerprint);
}

#[test]
fn fingerprint_tracks_prompt_content() {
    let cat = categorize_results(&interleaved_results());
    let (summaries, chunks) = label_results(&cat);

    let a = build_synthesis_prompt("What changed?", &summaries, &chunks, "en");
    let b = build_synthesis_prompt("What stayed the same?", &summaries, &chunks, "en");
    assert_ne!(a.fingerprint, b.fingerprint);
}

#[test]
fn prompt_blocks_carry_labels_sources_and_anchors() {
    let cat = categorize_results(&interleaved_results());
    let (summaries, chunks) = label_results(&cat);
    let prompt = build_synthesis_prompt("What changed?", &summaries, &chunks, "en");

    assert!(prompt.text.contains("=== TIER 1: DOCUMENT SUMMARIES ==="));
    assert!(prompt.text.contains("[S1] Unknown Document"));
    assert!(prompt.text.contains("Author: A. Author"));
    assert!(prompt.text.contains("Speaker: B. Speaker"));
    assert!(prompt.text.contains("=== TIER 2: SPECIFIC CHUNKS (WITH ANCHORS) ==="));
    assert!(prompt.text.contains("[C1] doc_a [Page 2]"));
    assert!(prompt.text.contains("[C2] doc_a [0:30-0:45]"));
    assert!(prompt.text.contains("[C3] doc_b"));
    assert!(prompt.text.contains("=== QUESTION ===\nWhat changed?"));
}

#[test]
fn zero_results_prompt_still_carries_the_question() {
    let cat = categorize_results(&[]);
    let (summaries, chunks) = label_results(&cat);
    let prompt = build_synthesis_prompt("Anything at all?", &summaries, &chunks, "en");

    assert!(prompt.text.contains("=== NO RELEVANT DOCUMENTS FOUND ==="));
    assert!(!prompt.text.contains("=== TIER 1"));
    assert!(!prompt.text.contains("=== TIER 2"));
    assert!(prompt.text.contains("=== QUESTION ===\nAnything at all?"));
}

#[test]
fn language_instruction_names_the_requested_language() {
    let cat = categorize_results(&[]);
    let (summaries, chunks) = label_results(&cat);

    let en = build_synthesis_prompt("q", &summaries, &chunks, "en");
    assert!(en.text.contains("Answer in English.\n"));

    let de = build_synthesis_prompt("q", &summaries, &chunks, "de");
    assert!(de.text.contains("Answer in de.\n"));
}

#[test]
fn chunk_text_is_truncated_in_the_prompt() {
    let long_text = "x".repeat(400);
    let results = vec![record("chunk_long", &long_text, json!({"source_id": "doc"}))];
    let cat = categorize_results(&results);
    let (summaries, chunks) = label_results(&cat);
    let prompt = build_synthesis_prompt("q", &summaries, &chunks, "en");

    let truncated = format!("{}...", "x".repeat(300));
    assert!(prompt.text.contains(&truncated));
    assert!(!prompt.text.contains(&"x".repeat(301)));
}
