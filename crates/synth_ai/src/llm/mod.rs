use serde::{Deserialize, Serialize};
use synth_core::error::AppError;

/// Generation tuning forwarded to the model backend on every call. Passed in
/// explicitly at invocation time, never read from ambient global state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationParams {
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        // Low temperature for factual, direct answers.
        Self {
            temperature: 0.1,
            top_p: 0.9,
            top_k: 20,
            max_output_tokens: 2048,
        }
    }
}

/// Injectable generation collaborator. Implementations apply their own request
/// timeout and must not retry internally; retryable failures are surfaced with
/// `retryable = true` for the caller to back off on.
pub trait Generator {
    fn generate(
        &self,
        model: &str,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, AppError>;
}

pub mod ollama;
