// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SSE stream parser for Anthropic streaming responses.

use std::pin::Pin;

use eventsource_stream::Eventsource;
use futures::stream::{Stream, StreamExt};
use memoir_core::{CompletionErrorKind, MemoirError};

use crate::types::{SseContentBlockDelta, SseError};

/// Typed SSE events from the Anthropic streaming protocol, reduced to
/// what a chat turn consumes.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// Incremental text update to a content block.
    ContentBlockDelta(SseContentBlockDelta),
    /// The message is complete.
    MessageStop,
    /// Keep-alive ping.
    Ping,
    /// API error during streaming.
    Error(SseError),
}

/// Parses a streaming response body into typed [`StreamEvent`]s.
/// Unknown event types are silently skipped per Anthropic's versioning
/// policy.
pub fn parse_sse_stream(
    response: reqwest::Response,
) -> Pin<Box<dyn Stream<Item = Result<StreamEvent, MemoirError>> + Send>> {
    let event_stream = response.bytes_stream().eventsource();

    let mapped = event_stream.filter_map(|result| async move {
        match result {
            Ok(event) => {
                let parsed = match event.event.as_str() {
                    "content_block_delta" => {
                        serde_json::from_str::<SseContentBlockDelta>(&event.data)
                            .map(StreamEvent::ContentBlockDelta)
                            .map_err(|e| {
                                MemoirError::completion(
                                    CompletionErrorKind::Other,
                                    format!("failed to parse content_block_delta: {e}"),
                                )
                            })
                    }
                    "message_stop" => Ok(StreamEvent::MessageStop),
                    "ping" => Ok(StreamEvent::Ping),
                    "error" => serde_json::from_str::<SseError>(&event.data)
                        .map(StreamEvent::Error)
                        .map_err(|e| {
                            MemoirError::completion(
                                CompletionErrorKind::Other,
                                format!("failed to parse error event: {e}"),
                            )
                        }),
                    _ => return None,
                };
                Some(parsed)
            }
            Err(e) => Some(Err(MemoirError::completion(
                CompletionErrorKind::Other,
                format!("SSE stream error: {e}"),
            ))),
        }
    });

    Box::pin(mapped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    async fn mock_sse_response(sse_text: &str) -> reqwest::Response {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse_text.to_string()),
            )
            .mount(&server)
            .await;
        reqwest::get(&server.uri()).await.unwrap()
    }

    #[tokio::test]
    async fn parse_content_block_delta() {
        let sse = "event: content_block_delta\ndata: {\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hello\"}}\n\n";
        let mut stream = parse_sse_stream(mock_sse_response(sse).await);

        let event = stream.next().await.unwrap().unwrap();
        match event {
            StreamEvent::ContentBlockDelta(delta) => match delta.delta {
                crate::types::SseDelta::TextDelta { ref text } => assert_eq!(text, "Hello"),
                _ => panic!("expected TextDelta"),
            },
            other => panic!("expected ContentBlockDelta, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_events_are_skipped() {
        let sse = "event: message_start\ndata: {\"message\":{}}\n\nevent: message_stop\ndata: {}\n\n";
        let mut stream = parse_sse_stream(mock_sse_response(sse).await);
        let event = stream.next().await.unwrap().unwrap();
        assert!(matches!(event, StreamEvent::MessageStop));
    }

    #[tokio::test]
    async fn parse_error_event() {
        let sse = "event: error\ndata: {\"error\":{\"type\":\"overloaded_error\",\"message\":\"Overloaded\"}}\n\n";
        let mut stream = parse_sse_stream(mock_sse_response(sse).await);
        let event = stream.next().await.unwrap().unwrap();
        match event {
            StreamEvent::Error(err) => assert_eq!(err.error.type_, "overloaded_error"),
            other => panic!("expected Error, got {other:?}"),
        }
    }
}
