// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./memoir.toml` > `~/.config/memoir/memoir.toml`
//! > `/etc/memoir/memoir.toml` with environment variable overrides via the
//! `MEMOIR_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::MemoirConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/memoir/memoir.toml` (system-wide)
/// 3. `~/.config/memoir/memoir.toml` (user XDG config)
/// 4. `./memoir.toml` (local directory)
/// 5. `MEMOIR_*` environment variables
pub fn load_config() -> Result<MemoirConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MemoirConfig::default()))
        .merge(Toml::file("/etc/memoir/memoir.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("memoir/memoir.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("memoir.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no file lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<MemoirConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MemoirConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MemoirConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MemoirConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `MEMOIR_STORAGE_DATABASE_PATH` must map
/// to `storage.database_path`, not `storage.database.path`.
fn env_provider() -> Env {
    Env::prefixed("MEMOIR_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("server_", "server.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("memory_", "memory.", 1)
            .replacen("websearch_", "websearch.", 1)
            .replacen("chat_", "chat.", 1)
            .replacen("auth_", "auth.", 1)
            .replacen("log_", "log.", 1);
        mapped.into()
    })
}
