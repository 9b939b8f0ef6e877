use serde::{Deserialize, Serialize};
use synth_core::categorize::categorize_results;
use synth_core::domain::{RecordWarning, RetrievalResult};
use synth_core::error::AppError;

use crate::citations::audit_citations;
use crate::llm::{GenerationParams, Generator};
use crate::prompt::{build_synthesis_prompt, label_results, LabeledChunk, LabeledSummary, SynthesisPrompt};

/// Per-request synthesis configuration, passed in explicitly so the pipeline
/// stays pure and testable against injected stubs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SynthesisConfig {
    pub model: String,
    pub language: String,
    pub params: GenerationParams,
}

impl SynthesisConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            language: "en".to_string(),
            params: GenerationParams::default(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

/// Generated answer plus the labeled source lists it cites. Labels here are
/// exactly the labels used during prompt construction; nothing is re-sorted,
/// re-numbered, or filtered after generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SynthesisResult {
    pub answer: String,
    pub summaries: Vec<LabeledSummary>,
    pub chunks: Vec<LabeledChunk>,
    pub total_results: u32,
    pub model: String,
    pub language: String,
    /// The prompt that produced the answer, kept for inspection and dumping.
    pub prompt: SynthesisPrompt,
    pub warnings: Vec<RecordWarning>,
}

/// Run one synthesis request: categorize, label, build the prompt, call the
/// generator, assemble the result. Single synchronous pass over
/// request-scoped data; nothing is cached and nothing is retried here.
///
/// An empty result set is valid: the prompt carries zero tier blocks and the
/// question still goes to generation. Generation failures are returned to the
/// caller unchanged.
pub fn synthesize_answer(
    question: &str,
    results: &[RetrievalResult],
    config: &SynthesisConfig,
    llm: &dyn Generator,
) -> Result<SynthesisResult, AppError> {
    let categorized = categorize_results(results);
    let (summaries, chunks) = label_results(&categorized);
    let prompt = build_synthesis_prompt(question, &summaries, &chunks, &config.language);

    let answer = llm.generate(&config.model, &prompt.text, &config.params)?;

    let mut warnings = categorized.warnings;
    warnings.extend(audit_citations(&answer, summaries.len(), chunks.len()));

    Ok(SynthesisResult {
        answer,
        summaries,
        chunks,
        total_results: categorized.total,
        model: config.model.clone(),
        language: config.language.clone(),
        prompt,
        warnings,
    })
}
