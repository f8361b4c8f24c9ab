// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Tavily-style search API.

use std::time::Duration;

use memoir_core::MemoirError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Ceiling the upstream API enforces on result counts.
const MAX_RESULTS_CAP: u32 = 10;

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    /// Page excerpt; the API calls this `content`.
    #[serde(rename = "content", default)]
    pub excerpt: String,
}

/// Search response: an optional synthesized answer plus ranked results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebSearchResponse {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub results: Vec<WebSearchResult>,
}

impl WebSearchResponse {
    /// Explicit empty sentinel returned on every failure path.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.answer.is_none() && self.results.is_empty()
    }
}

#[derive(Serialize)]
struct SearchPayload<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'a str,
    max_results: u32,
    include_answer: bool,
}

/// Search client. The API key is per-request because each user brings
/// their own.
#[derive(Debug, Clone)]
pub struct WebSearchClient {
    client: reqwest::Client,
    base_url: String,
}

impl WebSearchClient {
    pub fn new(base_url: String) -> Result<Self, MemoirError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MemoirError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Runs a search. Any failure (transport, status, parse) returns
    /// [`WebSearchResponse::empty`], never an error.
    pub async fn search(&self, api_key: &str, query: &str, max_results: u32) -> WebSearchResponse {
        let payload = SearchPayload {
            api_key,
            query,
            search_depth: "basic",
            max_results: max_results.min(MAX_RESULTS_CAP),
            include_answer: true,
        };

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .json(&payload)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => match resp.json::<WebSearchResponse>().await
            {
                Ok(parsed) => {
                    debug!(results = parsed.results.len(), "web search complete");
                    parsed
                }
                Err(e) => {
                    warn!(error = %e, "web search returned unparseable body");
                    WebSearchResponse::empty()
                }
            },
            Ok(resp) => {
                warn!(status = %resp.status(), "web search rejected");
                WebSearchResponse::empty()
            }
            Err(e) => {
                warn!(error = %e, "web search failed");
                WebSearchResponse::empty()
            }
        }
    }
}
