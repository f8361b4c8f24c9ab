// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Memoir chat backend.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Memoir configuration.
///
/// Loaded from TOML files with environment variable overrides. All sections
/// are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoirConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Relational storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// External memory service settings.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Web search service settings.
    #[serde(default)]
    pub websearch: WebSearchConfig,

    /// Chat defaults (model, provider, prompt).
    #[serde(default)]
    pub chat: ChatConfig,

    /// Authentication settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8090
}

/// Relational storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("memoir").join("memoir.db"))
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_else(|| "memoir.db".to_string())
}

/// External memory service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Base URL of the memory service.
    #[serde(default = "default_memory_base_url")]
    pub base_url: String,

    /// Timeout for write and scope calls, in seconds.
    #[serde(default = "default_memory_timeout")]
    pub request_timeout_secs: u64,

    /// Timeout for search calls, in seconds. Search is slower (reranking).
    #[serde(default = "default_search_timeout")]
    pub search_timeout_secs: u64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            base_url: default_memory_base_url(),
            request_timeout_secs: default_memory_timeout(),
            search_timeout_secs: default_search_timeout(),
        }
    }
}

fn default_memory_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_memory_timeout() -> u64 {
    10
}

fn default_search_timeout() -> u64 {
    60
}

/// Web search service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WebSearchConfig {
    /// Base URL of the search service.
    #[serde(default = "default_websearch_base_url")]
    pub base_url: String,

    /// Maximum results requested per search.
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            base_url: default_websearch_base_url(),
            max_results: default_max_results(),
        }
    }
}

fn default_websearch_base_url() -> String {
    "https://api.tavily.com".to_string()
}

fn default_max_results() -> u32 {
    5
}

/// Chat defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    /// Model used when a thread has none and the user sends no override.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Provider fallback when the requested model's vendor has no key.
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Maximum tokens to generate per response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Base system instructions. Empty uses the built-in persona text.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            default_provider: default_provider(),
            max_tokens: default_max_tokens(),
            system_prompt: None,
        }
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Secret used to sign bearer tokens. `None` generates an ephemeral
    /// secret at startup (tokens do not survive restarts).
    #[serde(default)]
    pub token_secret: Option<String>,

    /// Token lifetime in seconds.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: None,
            token_ttl_secs: default_token_ttl(),
        }
    }
}

fn default_token_ttl() -> u64 {
    86_400
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
