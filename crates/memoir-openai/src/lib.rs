// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI Chat Completions provider.

pub mod client;
pub mod sse;
pub mod types;

use async_trait::async_trait;
use memoir_core::{
    ChunkStream, CompletionProvider, CompletionRequest, CompletionResponse, MemoirError, Provider,
    TokenUsage,
};

pub use client::OpenAiClient;

use crate::types::{ChatRequest, WireMessage};

fn to_wire(request: &CompletionRequest) -> ChatRequest {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    if !request.system_prompt.is_empty() {
        messages.push(WireMessage {
            role: "system".to_string(),
            content: request.system_prompt.clone(),
        });
    }
    messages.extend(request.messages.iter().map(|m| WireMessage {
        role: m.role.to_string(),
        content: m.content.clone(),
    }));
    ChatRequest {
        model: request.model.clone(),
        messages,
        temperature: request.temperature,
        max_tokens: request.max_tokens,
        stream: request.stream,
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, MemoirError> {
        let response = self.complete_chat(&to_wire(&request)).await?;
        let usage = response.usage.as_ref().map_or(TokenUsage::default(), |u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
        });
        Ok(CompletionResponse {
            content: response.text(),
            model: response.model.clone(),
            usage,
        })
    }

    async fn stream(&self, request: CompletionRequest) -> Result<ChunkStream, MemoirError> {
        self.stream_chat(&to_wire(&request)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use memoir_core::{ChatMessage, CompletionChunk};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn core_request(stream: bool) -> CompletionRequest {
        CompletionRequest {
            model: "gpt-4o-mini".into(),
            system_prompt: "Be brief.".into(),
            messages: vec![ChatMessage::user("Hello")],
            temperature: 1.0,
            max_tokens: 256,
            stream,
        }
    }

    #[test]
    fn system_prompt_becomes_first_message() {
        let wire = to_wire(&core_request(false));
        assert_eq!(wire.messages[0].role, "system");
        assert_eq!(wire.messages[0].content, "Be brief.");
        assert_eq!(wire.messages[1].role, "user");
    }

    #[test]
    fn empty_system_prompt_adds_no_message() {
        let mut request = core_request(false);
        request.system_prompt = String::new();
        let wire = to_wire(&request);
        assert_eq!(wire.messages.len(), 1);
        assert_eq!(wire.messages[0].role, "user");
    }

    #[tokio::test]
    async fn stream_ends_with_done() {
        let server = MockServer::start().await;
        let sse = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"},\"finish_reason\":null}]}\n\n",
            "data: [DONE]\n\n",
        );
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse),
            )
            .mount(&server)
            .await;

        let client = OpenAiClient::new("sk-test")
            .unwrap()
            .with_base_url(server.uri());
        let mut chunks = client.stream(core_request(true)).await.unwrap();

        let mut collected = Vec::new();
        while let Some(chunk) = chunks.next().await {
            collected.push(chunk.unwrap());
        }
        assert_eq!(
            collected,
            vec![CompletionChunk::Delta("ok".into()), CompletionChunk::Done]
        );
    }
}
