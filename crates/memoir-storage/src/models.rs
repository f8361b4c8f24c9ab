// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.

use serde::{Deserialize, Serialize};

/// A registered account with per-provider API keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    /// Per-provider API keys, nullable until the user configures them.
    pub openai_key: Option<String>,
    pub anthropic_key: Option<String>,
    pub google_key: Option<String>,
    pub tavily_key: Option<String>,
    /// Provider used when the requested model's vendor has no key.
    pub default_provider: String,
    /// Free-form resolved location string ("Austin, TX, US").
    pub location: Option<String>,
    pub name: Option<String>,
    pub occupation: Option<String>,
    pub created_at: String,
}

/// A project grouping collaborative threads and shared memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: String,
    pub created_at: String,
}

/// Membership of a user in a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMember {
    pub project_id: String,
    pub user_id: String,
    pub role: String,
    pub created_at: String,
}

/// A conversation thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub title: String,
    pub owner_user_id: String,
    /// `None` for personal threads; set for project (team) threads.
    pub project_id: Option<String>,
    pub active_model: String,
    pub active_provider: String,
    pub temperature: f64,
    pub system_prompt: Option<String>,
    pub created_at: String,
    pub last_message_at: String,
}

/// One persisted turn (user or assistant), immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    pub thread_id: String,
    /// "user" or "assistant".
    pub sender: String,
    pub content: String,
    pub model_used: String,
    pub provider_used: String,
    pub prompt_tokens: Option<i64>,
    pub completion_tokens: Option<i64>,
    pub created_at: String,
}
