// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic Messages API provider.
//!
//! [`AnthropicClient`] speaks the vendor wire format; the
//! [`CompletionProvider`] impl normalizes it into the workspace types.

pub mod client;
pub mod sse;
pub mod types;

use async_trait::async_trait;
use futures::StreamExt;
use memoir_core::{
    ChunkStream, CompletionChunk, CompletionErrorKind, CompletionProvider, CompletionRequest,
    CompletionResponse, MemoirError, Provider, TokenUsage,
};

pub use client::AnthropicClient;

use crate::sse::StreamEvent;
use crate::types::{ApiMessage, MessageRequest, SseDelta};

fn to_wire(request: &CompletionRequest) -> MessageRequest {
    MessageRequest {
        model: request.model.clone(),
        messages: request
            .messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.to_string(),
                content: m.content.clone(),
            })
            .collect(),
        system: (!request.system_prompt.is_empty()).then(|| request.system_prompt.clone()),
        max_tokens: request.max_tokens,
        temperature: request.temperature,
        stream: request.stream,
    }
}

#[async_trait]
impl CompletionProvider for AnthropicClient {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, MemoirError> {
        let response = self.complete_message(&to_wire(&request)).await?;
        Ok(CompletionResponse {
            content: response.text(),
            model: response.model.clone(),
            usage: TokenUsage {
                prompt_tokens: response.usage.input_tokens,
                completion_tokens: response.usage.output_tokens,
            },
        })
    }

    async fn stream(&self, request: CompletionRequest) -> Result<ChunkStream, MemoirError> {
        let events = self.stream_message(&to_wire(&request)).await?;
        let chunks = events.filter_map(|event| async move {
            match event {
                Ok(StreamEvent::ContentBlockDelta(delta)) => match delta.delta {
                    SseDelta::TextDelta { text } => Some(Ok(CompletionChunk::Delta(text))),
                    SseDelta::InputJsonDelta { .. } => None,
                },
                Ok(StreamEvent::MessageStop) => Some(Ok(CompletionChunk::Done)),
                Ok(StreamEvent::Ping) => None,
                Ok(StreamEvent::Error(err)) => Some(Err(MemoirError::completion(
                    CompletionErrorKind::Other,
                    format!(
                        "Anthropic streaming error ({}): {}",
                        err.error.type_, err.error.message
                    ),
                ))),
                Err(e) => Some(Err(e)),
            }
        });
        Ok(Box::pin(chunks))
    }
}
