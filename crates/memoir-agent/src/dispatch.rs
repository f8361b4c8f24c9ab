// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider selection and construction.
//!
//! Model names pick their vendor by substring; a missing credential for
//! the detected vendor falls back to the user's default provider and
//! model rather than failing the turn outright.

use memoir_anthropic::AnthropicClient;
use memoir_core::{CompletionProvider, MemoirError, Provider};
use memoir_gemini::GeminiClient;
use memoir_openai::OpenAiClient;
use tracing::debug;

/// The per-provider API keys a user has configured.
#[derive(Debug, Clone, Default)]
pub struct UserKeys {
    pub openai: Option<String>,
    pub anthropic: Option<String>,
    pub google: Option<String>,
}

impl UserKeys {
    /// Key for one provider, if configured and non-empty.
    pub fn get(&self, provider: Provider) -> Option<&str> {
        let key = match provider {
            Provider::OpenAi => self.openai.as_deref(),
            Provider::Anthropic => self.anthropic.as_deref(),
            Provider::Google => self.google.as_deref(),
        };
        key.filter(|k| !k.is_empty())
    }
}

/// Outcome of provider selection for one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSelection {
    pub provider: Provider,
    pub model: String,
    pub api_key: String,
}

/// Picks the provider, model, and key for a turn.
///
/// The requested model's vendor wins when the user holds a key for it.
/// Otherwise the turn falls back to `default_provider` with
/// `default_model`; if no key exists there either, the turn fails with
/// [`MemoirError::MissingCredential`].
pub fn select_provider(
    model: &str,
    keys: &UserKeys,
    default_provider: Provider,
    default_model: &str,
) -> Result<ProviderSelection, MemoirError> {
    let detected = Provider::from_model(model).unwrap_or(default_provider);

    if let Some(key) = keys.get(detected) {
        return Ok(ProviderSelection {
            provider: detected,
            model: model.to_string(),
            api_key: key.to_string(),
        });
    }

    if detected != default_provider
        && let Some(key) = keys.get(default_provider)
    {
        debug!(
            requested = %detected,
            fallback = %default_provider,
            "no key for requested provider, using default"
        );
        return Ok(ProviderSelection {
            provider: default_provider,
            model: default_model.to_string(),
            api_key: key.to_string(),
        });
    }

    Err(MemoirError::MissingCredential {
        provider: detected.to_string(),
    })
}

/// Per-provider base URL overrides (self-hosted gateways, tests).
#[derive(Debug, Clone, Default)]
pub struct BaseUrlOverrides {
    pub openai: Option<String>,
    pub anthropic: Option<String>,
    pub google: Option<String>,
}

/// Builds the vendor client behind the uniform provider trait.
pub fn build_provider(
    provider: Provider,
    api_key: &str,
    overrides: &BaseUrlOverrides,
) -> Result<Box<dyn CompletionProvider>, MemoirError> {
    Ok(match provider {
        Provider::OpenAi => {
            let mut client = OpenAiClient::new(api_key)?;
            if let Some(url) = &overrides.openai {
                client = client.with_base_url(url.clone());
            }
            Box::new(client)
        }
        Provider::Anthropic => {
            let mut client = AnthropicClient::new(api_key)?;
            if let Some(url) = &overrides.anthropic {
                client = client.with_base_url(url.clone());
            }
            Box::new(client)
        }
        Provider::Google => {
            let mut client = GeminiClient::new(api_key)?;
            if let Some(url) = &overrides.google {
                client = client.with_base_url(url.clone());
            }
            Box::new(client)
        }
    })
}
