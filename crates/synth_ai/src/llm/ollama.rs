use std::time::Duration;

use serde::{Deserialize, Serialize};
use synth_core::error::AppError;

use super::{GenerationParams, Generator};

const GENERATE_TIMEOUT: Duration = Duration::from_secs(30);
const HEALTH_TIMEOUT: Duration = Duration::from_millis(800);

/// Client for a local Ollama server. Strictly limited to `127.0.0.1`.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let base_url = base_url.trim_end_matches('/').to_string();

        let invalid = || {
            AppError::new(
                "GEN_REMOTE_NOT_ALLOWED",
                "Generation base URL must be localhost (127.0.0.1)",
            )
            .with_details(format!("base_url={base_url}"))
        };

        // Binding constraint: local-only via 127.0.0.1, optionally with an
        // explicit port. Anything after the host other than `:<port>` is a
        // bypass attempt.
        let rest = base_url.strip_prefix("http://127.0.0.1").ok_or_else(invalid)?;
        if !rest.is_empty() {
            let port = rest.strip_prefix(':').ok_or_else(invalid)?;
            let port: u32 = port.parse().map_err(|_| invalid())?;
            if port == 0 || port > 65535 {
                return Err(invalid());
            }
        }

        Ok(Self { base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn health_check(&self) -> Result<(), AppError> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = ureq::get(&url).timeout(HEALTH_TIMEOUT).call();

        match resp {
            Ok(r) if r.status() == 200 => Ok(()),
            Ok(r) => Err(
                AppError::new("GEN_UNHEALTHY", "Generation backend health check failed")
                    .with_details(format!("status={}", r.status())),
            ),
            Err(e) => Err(AppError::new(
                "GEN_UNREACHABLE",
                "Failed to reach generation backend on 127.0.0.1",
            )
            .with_details(e.to_string())
            .with_retryable(true)),
        }
    }
}

/// `Generator` backed by the Ollama `/api/generate` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    client: OllamaClient,
    timeout: Duration,
}

impl OllamaGenerator {
    pub fn new(client: OllamaClient) -> Self {
        Self {
            client,
            timeout: GENERATE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Clone, Serialize)]
struct GenerateOptions {
    temperature: f64,
    top_p: f64,
    top_k: u32,
    num_predict: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl Generator for OllamaGenerator {
    fn generate(
        &self,
        model: &str,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, AppError> {
        let url = format!("{}/api/generate", self.client.base_url());
        let req = GenerateRequest {
            model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: params.temperature,
                top_p: params.top_p,
                top_k: params.top_k,
                num_predict: params.max_output_tokens,
            },
        };

        let resp = ureq::post(&url)
            .timeout(self.timeout)
            .send_json(serde_json::to_value(req).map_err(|e| {
                AppError::new("GEN_REQUEST_FAILED", "Failed to encode generation request")
                    .with_details(e.to_string())
            })?);

        match resp {
            Ok(r) if r.status() == 200 => {
                let v: GenerateResponse = r.into_json().map_err(|e| {
                    AppError::new("GEN_REQUEST_FAILED", "Failed to decode generation response")
                        .with_details(e.to_string())
                })?;
                if v.response.trim().is_empty() {
                    return Err(AppError::new(
                        "GEN_EMPTY_RESPONSE",
                        "Generation response was empty",
                    ));
                }
                Ok(v.response)
            }
            Ok(r) => {
                // Quota exhaustion and overload are retryable for the caller;
                // this client never retries on its own.
                let status = r.status();
                Err(
                    AppError::new("GEN_REQUEST_FAILED", "Generation request failed")
                        .with_details(format!("status={status}"))
                        .with_retryable(status == 429 || status == 503),
                )
            }
            Err(e) => Err(
                AppError::new("GEN_REQUEST_FAILED", "Failed to call generation endpoint")
                    .with_details(e.to_string())
                    .with_retryable(true),
            ),
        }
    }
}
