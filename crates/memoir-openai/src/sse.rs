// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SSE parser for OpenAI streamed completions.
//!
//! OpenAI streams unnamed events whose data is either a JSON chunk or
//! the literal `[DONE]` sentinel.

use std::pin::Pin;

use eventsource_stream::Eventsource;
use futures::stream::{Stream, StreamExt};
use memoir_core::{CompletionChunk, CompletionErrorKind, MemoirError};

use crate::types::StreamChunk;

/// Parses a streaming response body straight into [`CompletionChunk`]s.
/// Chunks without delta text (role-only preludes, finish markers) are
/// skipped.
pub fn parse_sse_stream(
    response: reqwest::Response,
) -> Pin<Box<dyn Stream<Item = Result<CompletionChunk, MemoirError>> + Send>> {
    let event_stream = response.bytes_stream().eventsource();

    let mapped = event_stream.filter_map(|result| async move {
        match result {
            Ok(event) => {
                if event.data.trim() == "[DONE]" {
                    return Some(Ok(CompletionChunk::Done));
                }
                match serde_json::from_str::<StreamChunk>(&event.data) {
                    Ok(chunk) => chunk
                        .delta_text()
                        .filter(|t| !t.is_empty())
                        .map(|t| Ok(CompletionChunk::Delta(t.to_string()))),
                    Err(e) => Some(Err(MemoirError::completion(
                        CompletionErrorKind::Other,
                        format!("failed to parse stream chunk: {e}"),
                    ))),
                }
            }
            Err(e) => Some(Err(MemoirError::completion(
                CompletionErrorKind::Other,
                format!("SSE stream error: {e}"),
            ))),
        }
    });

    Box::pin(mapped)
}
