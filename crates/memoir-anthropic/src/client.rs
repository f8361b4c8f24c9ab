// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Anthropic Messages API.
//!
//! Handles request construction, authentication, streaming SSE
//! responses, transient-error retry, and error classification.

use std::pin::Pin;
use std::time::Duration;

use futures::Stream;
use memoir_core::{CompletionErrorKind, MemoirError};
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::sse::{self, StreamEvent};
use crate::types::{ApiErrorResponse, MessageRequest, MessageResponse};

const API_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// HTTP client for Anthropic API communication.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: reqwest::Client,
    max_retries: u32,
    base_url: String,
}

impl AnthropicClient {
    /// Creates a client with the user's API key baked into headers.
    pub fn new(api_key: &str) -> Result<Self, MemoirError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(api_key).map_err(|e| {
                MemoirError::Config(format!("invalid API key header value: {e}"))
            })?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| MemoirError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_retries: 1,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Overrides the base URL (self-hosted gateways, tests).
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }

    /// Sends a streaming request and returns a stream of SSE events.
    ///
    /// On transient errors (429, 500, 503, 529), retries once after a
    /// 1-second delay.
    pub async fn stream_message(
        &self,
        request: &MessageRequest,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<StreamEvent, MemoirError>> + Send>>, MemoirError>
    {
        let mut req = request.clone();
        req.stream = true;

        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying streaming request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(self.endpoint())
                .json(&req)
                .send()
                .await
                .map_err(|e| {
                    MemoirError::completion(
                        CompletionErrorKind::Other,
                        format!("HTTP request failed: {e}"),
                    )
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "streaming response received");

            if status.is_success() {
                return Ok(sse::parse_sse_stream(response));
            }

            if is_transient_error(status) && attempt < self.max_retries {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(error_from_response(status, &body));
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(error_from_response(status, &body));
        }

        Err(last_error.unwrap_or_else(|| {
            MemoirError::completion(
                CompletionErrorKind::Other,
                "streaming request failed after retries",
            )
        }))
    }

    /// Sends a non-streaming request and returns the full response.
    pub async fn complete_message(
        &self,
        request: &MessageRequest,
    ) -> Result<MessageResponse, MemoirError> {
        let mut req = request.clone();
        req.stream = false;

        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying completion request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(self.endpoint())
                .json(&req)
                .send()
                .await
                .map_err(|e| {
                    MemoirError::completion(
                        CompletionErrorKind::Other,
                        format!("HTTP request failed: {e}"),
                    )
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "completion response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| {
                    MemoirError::completion(
                        CompletionErrorKind::Other,
                        format!("failed to read response body: {e}"),
                    )
                })?;
                return serde_json::from_str(&body).map_err(|e| {
                    MemoirError::completion(
                        CompletionErrorKind::Other,
                        format!("failed to parse API response: {e}"),
                    )
                });
            }

            if is_transient_error(status) && attempt < self.max_retries {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(error_from_response(status, &body));
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(error_from_response(status, &body));
        }

        Err(last_error.unwrap_or_else(|| {
            MemoirError::completion(
                CompletionErrorKind::Other,
                "completion request failed after retries",
            )
        }))
    }
}

fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503 | 529)
}

/// Builds a classified completion error from an API failure.
pub(crate) fn error_from_response(status: reqwest::StatusCode, body: &str) -> MemoirError {
    let message = if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(body) {
        format!(
            "Anthropic API error ({}): {}",
            api_err.error.type_, api_err.error.message
        )
    } else {
        format!("API returned {status}: {body}")
    };
    MemoirError::completion(classify_status(status, body), message)
}

fn classify_status(status: reqwest::StatusCode, body: &str) -> CompletionErrorKind {
    match status.as_u16() {
        401 | 403 => CompletionErrorKind::InvalidCredential,
        402 => CompletionErrorKind::QuotaExceeded,
        429 => CompletionErrorKind::RateLimited,
        404 => CompletionErrorKind::ModelUnavailable,
        _ => {
            let lower = body.to_lowercase();
            if lower.contains("insufficient_quota") {
                CompletionErrorKind::QuotaExceeded
            } else if lower.contains("model") {
                CompletionErrorKind::ModelUnavailable
            } else {
                CompletionErrorKind::Other
            }
        }
    }
}
