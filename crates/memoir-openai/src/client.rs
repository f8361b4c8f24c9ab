// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the OpenAI Chat Completions API.

use std::pin::Pin;
use std::time::Duration;

use futures::Stream;
use memoir_core::{CompletionChunk, CompletionErrorKind, MemoirError};
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::sse;
use crate::types::{ApiErrorResponse, ChatRequest, ChatResponse};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// HTTP client for OpenAI API communication. Bearer authentication,
/// one retry on transient errors.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    max_retries: u32,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: &str) -> Result<Self, MemoirError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
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

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    /// Sends a streaming request and returns normalized chunks.
    pub async fn stream_chat(
        &self,
        request: &ChatRequest,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<CompletionChunk, MemoirError>> + Send>>, MemoirError>
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
    pub async fn complete_chat(&self, request: &ChatRequest) -> Result<ChatResponse, MemoirError> {
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
    matches!(status.as_u16(), 429 | 500 | 503)
}

pub(crate) fn error_from_response(status: reqwest::StatusCode, body: &str) -> MemoirError {
    let message = if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(body) {
        format!("OpenAI API error: {}", api_err.error.message)
    } else {
        format!("API returned {status}: {body}")
    };
    MemoirError::completion(classify_status(status, body), message)
}

/// OpenAI signals exhausted quota with a 429 plus an
/// `insufficient_quota` code, so the body check runs first.
fn classify_status(status: reqwest::StatusCode, body: &str) -> CompletionErrorKind {
    if body.contains("insufficient_quota") {
        return CompletionErrorKind::QuotaExceeded;
    }
    match status.as_u16() {
        401 | 403 => CompletionErrorKind::InvalidCredential,
        402 => CompletionErrorKind::QuotaExceeded,
        429 => CompletionErrorKind::RateLimited,
        404 => CompletionErrorKind::ModelUnavailable,
        _ => {
            if body.to_lowercase().contains("model") {
                CompletionErrorKind::ModelUnavailable
            } else {
                CompletionErrorKind::Other
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WireMessage;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> OpenAiClient {
        OpenAiClient::new("sk-test")
            .unwrap()
            .with_base_url(base_url.to_string())
    }

    fn test_request() -> ChatRequest {
        ChatRequest {
            model: "gpt-4o-mini".into(),
            messages: vec![WireMessage {
                role: "user".into(),
                content: "Hello".into(),
            }],
            temperature: 1.0,
            max_tokens: 1024,
            stream: false,
        }
    }

    fn success_body(text: &str) -> serde_json::Value {
        json!({
            "id": "chatcmpl-test",
            "model": "gpt-4o-mini",
            "choices": [{"message": {"role": "assistant", "content": text}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        })
    }

    #[tokio::test]
    async fn complete_chat_success_with_bearer_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("Hi there!")))
            .mount(&server)
            .await;

        let result = test_client(&server.uri())
            .complete_chat(&test_request())
            .await
            .unwrap();
        assert_eq!(result.text(), "Hi there!");
    }

    #[tokio::test]
    async fn retries_once_on_500_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("After retry")))
            .mount(&server)
            .await;

        let result = test_client(&server.uri())
            .complete_chat(&test_request())
            .await
            .unwrap();
        assert_eq!(result.text(), "After retry");
    }

    #[tokio::test]
    async fn insufficient_quota_beats_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {
                    "message": "You exceeded your current quota.",
                    "type": "insufficient_quota",
                    "code": "insufficient_quota"
                }
            })))
            .expect(2)
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .complete_chat(&test_request())
            .await
            .unwrap_err();
        match err {
            MemoirError::Completion { kind, .. } => {
                assert_eq!(kind, CompletionErrorKind::QuotaExceeded)
            }
            other => panic!("expected Completion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn invalid_key_classifies_as_invalid_credential() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"message": "Incorrect API key provided.", "type": "invalid_request_error", "code": "invalid_api_key"}
            })))
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .complete_chat(&test_request())
            .await
            .unwrap_err();
        match err {
            MemoirError::Completion { kind, message, .. } => {
                assert_eq!(kind, CompletionErrorKind::InvalidCredential);
                assert!(message.contains("Incorrect API key"), "got: {message}");
            }
            other => panic!("expected Completion, got {other:?}"),
        }
    }
}
