use std::time::Duration;

use serde::{Deserialize, Serialize};
use synth_core::domain::RetrievalResult;
use synth_core::error::AppError;

const SEARCH_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_RESULTS: u32 = 50;

/// Injectable retrieval collaborator: an ordered, ranked record list for a
/// query. Ranking and scoring live entirely behind this boundary; the
/// pipeline never reorders what comes back.
pub trait Retriever {
    fn search(&self, query: &str, k: u32) -> Result<Vec<RetrievalResult>, AppError>;
}

/// HTTP retrieval client posting `{query, k}` to a search service and
/// decoding its `{results: [...]}` response.
#[derive(Debug, Clone)]
pub struct SearchClient {
    base_url: String,
    timeout: Duration,
}

impl SearchClient {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(
                AppError::new("SEARCH_URL_INVALID", "Search base URL must be http(s)")
                    .with_details(format!("base_url={base_url}")),
            );
        }
        Ok(Self {
            base_url,
            timeout: SEARCH_TIMEOUT,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    k: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct SearchResponse {
    results: Vec<RetrievalResult>,
}

impl Retriever for SearchClient {
    fn search(&self, query: &str, k: u32) -> Result<Vec<RetrievalResult>, AppError> {
        let q = query.trim();
        if q.is_empty() {
            return Err(AppError::new("SEARCH_QUERY_EMPTY", "Query must not be empty"));
        }
        let k = k.max(1).min(MAX_RESULTS);

        let url = format!("{}/search", self.base_url);
        let req = SearchRequest { query: q, k };
        let resp = ureq::post(&url)
            .timeout(self.timeout)
            .send_json(serde_json::to_value(req).map_err(|e| {
                AppError::new("SEARCH_FAILED", "Failed to encode search request")
                    .with_details(e.to_string())
            })?);

        match resp {
            Ok(r) if r.status() == 200 => {
                let v: SearchResponse = r.into_json().map_err(|e| {
                    AppError::new("SEARCH_FAILED", "Failed to decode search response")
                        .with_details(e.to_string())
                })?;
                Ok(v.results)
            }
            Ok(r) => Err(AppError::new("SEARCH_FAILED", "Search request failed")
                .with_details(format!("status={}", r.status()))),
            Err(e) => Err(AppError::new("SEARCH_FAILED", "Failed to call search endpoint")
                .with_details(e.to_string())
                .with_retryable(true)),
        }
    }
}
