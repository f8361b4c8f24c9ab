// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Gemini provider.

pub mod client;
pub mod types;

use async_trait::async_trait;
use memoir_core::{
    ChunkStream, CompletionProvider, CompletionRequest, CompletionResponse, MemoirError, Provider,
    Role, TokenUsage,
};

pub use client::GeminiClient;

use crate::types::{Content, GenerateRequest, GenerationConfig};

fn to_wire(request: &CompletionRequest) -> GenerateRequest {
    GenerateRequest {
        system_instruction: (!request.system_prompt.is_empty())
            .then(|| Content::text(None, &request.system_prompt)),
        contents: request
            .messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                };
                Content::text(Some(role), &m.content)
            })
            .collect(),
        generation_config: GenerationConfig {
            temperature: request.temperature,
            max_output_tokens: request.max_tokens,
        },
    }
}

#[async_trait]
impl CompletionProvider for GeminiClient {
    fn provider(&self) -> Provider {
        Provider::Google
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, MemoirError> {
        let response = self.complete_generate(&request.model, &to_wire(&request)).await?;
        let usage = response
            .usage_metadata
            .as_ref()
            .map_or(TokenUsage::default(), |u| TokenUsage {
                prompt_tokens: u.prompt_token_count,
                completion_tokens: u.candidates_token_count,
            });
        let model = response
            .model_version
            .clone()
            .unwrap_or_else(|| request.model.clone());
        Ok(CompletionResponse {
            content: response.text(),
            model,
            usage,
        })
    }

    async fn stream(&self, request: CompletionRequest) -> Result<ChunkStream, MemoirError> {
        self.stream_generate(&request.model, &to_wire(&request)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memoir_core::ChatMessage;

    #[test]
    fn assistant_role_maps_to_model() {
        let request = CompletionRequest {
            model: "gemini-1.5-flash".into(),
            system_prompt: "Be brief.".into(),
            messages: vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")],
            temperature: 0.5,
            max_tokens: 128,
            stream: false,
        };
        let wire = to_wire(&request);
        assert!(wire.system_instruction.is_some());
        assert_eq!(wire.contents[0].role.as_deref(), Some("user"));
        assert_eq!(wire.contents[1].role.as_deref(), Some("model"));
        assert_eq!(wire.generation_config.max_output_tokens, 128);
    }

    #[test]
    fn empty_system_prompt_omits_instruction() {
        let request = CompletionRequest {
            model: "gemini-1.5-flash".into(),
            system_prompt: String::new(),
            messages: vec![],
            temperature: 1.0,
            max_tokens: 64,
            stream: false,
        };
        assert!(to_wire(&request).system_instruction.is_none());
    }
}
