// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Memoir chat backend.

use thiserror::Error;

/// Subtypes of a failed completion call, each with a distinct user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionErrorKind {
    /// The provider rejected the API key.
    InvalidCredential,
    /// The account behind the key has no remaining quota.
    QuotaExceeded,
    /// The provider is rate limiting requests.
    RateLimited,
    /// The requested model does not exist or is not accessible.
    ModelUnavailable,
    /// Anything else: network failure, malformed response, 5xx.
    Other,
}

impl CompletionErrorKind {
    /// Remediation message surfaced to the end user for this failure class.
    pub fn user_message(&self) -> &'static str {
        match self {
            CompletionErrorKind::InvalidCredential => {
                "Invalid API key. Please update your API key in settings."
            }
            CompletionErrorKind::QuotaExceeded => {
                "API key has insufficient quota. Please check your provider account."
            }
            CompletionErrorKind::RateLimited => {
                "The model provider is rate limiting requests. Please try again shortly."
            }
            CompletionErrorKind::ModelUnavailable => {
                "The requested model is unavailable. Please pick a different model."
            }
            CompletionErrorKind::Other => "The model provider returned an error.",
        }
    }
}

impl std::fmt::Display for CompletionErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CompletionErrorKind::InvalidCredential => "invalid_credential",
            CompletionErrorKind::QuotaExceeded => "quota_exceeded",
            CompletionErrorKind::RateLimited => "rate_limited",
            CompletionErrorKind::ModelUnavailable => "model_unavailable",
            CompletionErrorKind::Other => "other",
        };
        write!(f, "{s}")
    }
}

/// The primary error type used across all Memoir crates.
///
/// Gateway crates convert upstream failures at their boundary: memory and
/// search outages never surface as this type to turn processing (they degrade
/// to empty results). Only access, credential, completion, and storage
/// failures propagate.
#[derive(Debug, Error)]
pub enum MemoirError {
    /// Configuration errors (invalid TOML, missing required fields).
    #[error("configuration error: {0}")]
    Config(String),

    /// Relational storage errors (connection, query failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The acting user does not own the thread and is not a project member.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// No usable API key for the provider the turn resolved to.
    #[error("no API key configured for provider {provider}")]
    MissingCredential { provider: String },

    /// A completion provider call failed. Fatal to the turn only.
    #[error("completion error ({kind}): {message}")]
    Completion {
        kind: CompletionErrorKind,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A memory or search collaborator failed. Callers at the gateway
    /// boundary convert this to an empty result before it reaches a turn.
    #[error("{service} unavailable: {message}")]
    Upstream { service: String, message: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MemoirError {
    /// Shorthand for a completion error without an underlying source.
    pub fn completion(kind: CompletionErrorKind, message: impl Into<String>) -> Self {
        MemoirError::Completion {
            kind,
            message: message.into(),
            source: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_kinds_have_distinct_user_messages() {
        let kinds = [
            CompletionErrorKind::InvalidCredential,
            CompletionErrorKind::QuotaExceeded,
            CompletionErrorKind::RateLimited,
            CompletionErrorKind::ModelUnavailable,
            CompletionErrorKind::Other,
        ];
        let messages: std::collections::HashSet<_> =
            kinds.iter().map(|k| k.user_message()).collect();
        assert_eq!(messages.len(), kinds.len());
    }

    #[test]
    fn error_display_includes_kind() {
        let err = MemoirError::completion(CompletionErrorKind::RateLimited, "429 from upstream");
        let s = err.to_string();
        assert!(s.contains("rate_limited"), "got: {s}");
        assert!(s.contains("429 from upstream"), "got: {s}");
    }

    #[test]
    fn missing_credential_names_provider() {
        let err = MemoirError::MissingCredential {
            provider: "anthropic".into(),
        };
        assert!(err.to_string().contains("anthropic"));
    }
}
