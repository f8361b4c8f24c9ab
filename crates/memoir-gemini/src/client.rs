// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Gemini generateContent API.
//!
//! Gemini streams SSE chunks shaped like whole responses and closes the
//! stream without a sentinel, so the parser appends the end-of-stream
//! marker itself.

use std::pin::Pin;
use std::time::Duration;

use eventsource_stream::Eventsource;
use futures::stream::{self, Stream, StreamExt};
use memoir_core::{CompletionChunk, CompletionErrorKind, MemoirError};
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, GenerateRequest, GenerateResponse};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// HTTP client for Gemini API communication.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    max_retries: u32,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: &str) -> Result<Self, MemoirError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(api_key).map_err(|e| {
                MemoirError::Config(format!("invalid API key header value: {e}"))
            })?,
        );
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

    /// Overrides the base URL (proxies, tests).
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, model: &str, streaming: bool) -> String {
        if streaming {
            format!(
                "{}/v1beta/models/{model}:streamGenerateContent?alt=sse",
                self.base_url
            )
        } else {
            format!("{}/v1beta/models/{model}:generateContent", self.base_url)
        }
    }

    /// Sends a streaming request and returns normalized chunks,
    /// terminated by an explicit end-of-stream marker.
    pub async fn stream_generate(
        &self,
        model: &str,
        request: &GenerateRequest,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<CompletionChunk, MemoirError>> + Send>>, MemoirError>
    {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying streaming request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(self.endpoint(model, true))
                .json(request)
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
                return Ok(parse_sse_stream(response));
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
    pub async fn complete_generate(
        &self,
        model: &str,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, MemoirError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying completion request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(self.endpoint(model, false))
                .json(request)
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

fn parse_sse_stream(
    response: reqwest::Response,
) -> Pin<Box<dyn Stream<Item = Result<CompletionChunk, MemoirError>> + Send>> {
    let event_stream = response.bytes_stream().eventsource();

    let deltas = event_stream.filter_map(|result| async move {
        match result {
            Ok(event) => match serde_json::from_str::<GenerateResponse>(&event.data) {
                Ok(chunk) => {
                    let text = chunk.text();
                    (!text.is_empty()).then(|| Ok(CompletionChunk::Delta(text)))
                }
                Err(e) => Some(Err(MemoirError::completion(
                    CompletionErrorKind::Other,
                    format!("failed to parse stream chunk: {e}"),
                ))),
            },
            Err(e) => Some(Err(MemoirError::completion(
                CompletionErrorKind::Other,
                format!("SSE stream error: {e}"),
            ))),
        }
    });

    Box::pin(deltas.chain(stream::once(async { Ok(CompletionChunk::Done) })))
}

fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}

pub(crate) fn error_from_response(status: reqwest::StatusCode, body: &str) -> MemoirError {
    let message = if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(body) {
        format!("Gemini API error: {}", api_err.error.message)
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
