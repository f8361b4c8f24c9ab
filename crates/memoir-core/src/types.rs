// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Memoir workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// One of the interchangeable LLM vendors behind the completion dispatcher.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Anthropic,
    Google,
}

impl Provider {
    /// Detects the provider for a model identifier by name substring.
    ///
    /// Returns `None` for model names that match no known vendor family;
    /// callers fall back to the user's default provider.
    pub fn from_model(model: &str) -> Option<Provider> {
        let lower = model.to_lowercase();
        if lower.contains("gpt") || lower.starts_with("o1") {
            Some(Provider::OpenAi)
        } else if lower.contains("claude") {
            Some(Provider::Anthropic)
        } else if lower.contains("gemini") {
            Some(Provider::Google)
        } else {
            None
        }
    }
}

/// Role of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of conversation history passed to a completion provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A request to a completion provider.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub system_prompt: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub stream: bool,
}

/// Token accounting from a completion call.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// A whole (non-streamed) response from a completion provider.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub usage: TokenUsage,
}

/// One event from a streaming completion.
///
/// Every stream is terminated by exactly one `Done` marker; consumers
/// accumulate `Delta` fragments to recover the full reply for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionChunk {
    /// A fragment of reply text.
    Delta(String),
    /// Explicit end-of-stream marker.
    Done,
}
