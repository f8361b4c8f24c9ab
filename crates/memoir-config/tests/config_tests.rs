// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Memoir configuration system.

use memoir_config::load_config_from_str;

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_memoir_config() {
    let toml = r#"
[server]
host = "0.0.0.0"
port = 9000

[storage]
database_path = "/tmp/test.db"

[memory]
base_url = "http://memmachine:8080"
request_timeout_secs = 5
search_timeout_secs = 30

[websearch]
base_url = "https://search.example.com"
max_results = 8

[chat]
default_model = "claude-3-5-haiku-20241022"
default_provider = "anthropic"
max_tokens = 2048
system_prompt = "Be terse."

[auth]
token_secret = "hunter2"
token_ttl_secs = 3600

[log]
level = "debug"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.storage.database_path, "/tmp/test.db");
    assert_eq!(config.memory.base_url, "http://memmachine:8080");
    assert_eq!(config.memory.request_timeout_secs, 5);
    assert_eq!(config.memory.search_timeout_secs, 30);
    assert_eq!(config.websearch.max_results, 8);
    assert_eq!(config.chat.default_model, "claude-3-5-haiku-20241022");
    assert_eq!(config.chat.default_provider, "anthropic");
    assert_eq!(config.chat.max_tokens, 2048);
    assert_eq!(config.chat.system_prompt.as_deref(), Some("Be terse."));
    assert_eq!(config.auth.token_secret.as_deref(), Some("hunter2"));
    assert_eq!(config.auth.token_ttl_secs, 3600);
    assert_eq!(config.log.level, "debug");
}

/// Unknown field in a section is rejected with an actionable error.
#[test]
fn unknown_field_produces_error() {
    let toml = r#"
[server]
hsot = "0.0.0.0"
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("hsot"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8090);
    assert_eq!(config.memory.base_url, "http://127.0.0.1:8080");
    assert_eq!(config.memory.search_timeout_secs, 60);
    assert_eq!(config.websearch.max_results, 5);
    assert_eq!(config.chat.default_model, "gpt-4o-mini");
    assert_eq!(config.chat.default_provider, "openai");
    assert!(config.chat.system_prompt.is_none());
    assert!(config.auth.token_secret.is_none());
    assert_eq!(config.auth.token_ttl_secs, 86_400);
    assert_eq!(config.log.level, "info");
}

/// Partial section: unspecified fields in a present section still default.
#[test]
fn partial_section_fills_remaining_defaults() {
    let toml = r#"
[chat]
default_model = "gemini-1.5-flash"
"#;
    let config = load_config_from_str(toml).unwrap();
    assert_eq!(config.chat.default_model, "gemini-1.5-flash");
    assert_eq!(config.chat.default_provider, "openai");
    assert_eq!(config.chat.max_tokens, 4096);
}
