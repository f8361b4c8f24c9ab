// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assembles the per-turn system prompt.
//!
//! Section order is fixed: base instructions, date/time, location,
//! profile facts, current-thread memory, other-thread memory, documents,
//! web search. Item caps bound prompt growth against an ever-expanding
//! memory store; most specific context sits closest to the top.

use chrono::{DateTime, Utc};

/// Cap on semantic/profile facts included per turn.
pub const MAX_PROFILE_FACTS: usize = 30;
/// Cap on current-thread episodic memories.
pub const MAX_CURRENT_THREAD: usize = 20;
/// Cap on cross-thread episodic memories.
pub const MAX_OTHER_THREAD: usize = 15;

const DEFAULT_PERSONA: &str =
    "You are a helpful AI assistant with persistent memory and web search capabilities.";

/// Everything the orchestrator gathered for one turn.
#[derive(Debug, Clone)]
pub struct PromptSections {
    /// Thread-level system prompt; empty means the default persona.
    pub base_instructions: String,
    pub now: DateTime<Utc>,
    pub user_location: Option<String>,
    pub profile_facts: Vec<String>,
    pub current_thread: Vec<String>,
    pub other_thread: Vec<String>,
    pub documents: Vec<String>,
    /// Pre-formatted web-search block; empty means search did not run.
    pub web_search: String,
}

/// Builds the final system prompt. Empty inputs omit their section
/// entirely, separator included.
pub fn compose(sections: &PromptSections) -> String {
    let mut parts: Vec<String> = Vec::new();

    if sections.base_instructions.trim().is_empty() {
        parts.push(DEFAULT_PERSONA.to_string());
    } else {
        parts.push(sections.base_instructions.trim().to_string());
    }

    parts.push(format!(
        "Current date and time: {} UTC",
        sections.now.format("%A, %B %-d, %Y, %H:%M")
    ));

    if let Some(location) = &sections.user_location
        && !location.trim().is_empty()
    {
        parts.push(format!("The user is located in {}.", location.trim()));
    }

    if !sections.profile_facts.is_empty() {
        parts.push(bullet_section(
            "WHAT YOU KNOW ABOUT THE USER:",
            &sections.profile_facts,
            MAX_PROFILE_FACTS,
        ));
    }

    if !sections.current_thread.is_empty() {
        parts.push(bullet_section(
            "RELEVANT CONTEXT FROM THIS CONVERSATION:",
            &sections.current_thread,
            MAX_CURRENT_THREAD,
        ));
    }

    if !sections.other_thread.is_empty() {
        parts.push(bullet_section(
            "RELEVANT MEMORIES FROM PREVIOUS CONVERSATIONS (from other chats):",
            &sections.other_thread,
            MAX_OTHER_THREAD,
        ));
    }

    if !sections.documents.is_empty() {
        parts.push(format!(
            "Recently uploaded documents:\n{}",
            sections.documents.join("\n\n")
        ));
    }

    if !sections.web_search.trim().is_empty() {
        parts.push(format!(
            "WEB SEARCH RESULTS:\n{}\n\nUse the web search results above to provide current, accurate information.",
            sections.web_search.trim()
        ));
    }

    parts.join("\n\n")
}

fn bullet_section(header: &str, items: &[String], cap: usize) -> String {
    let bullets: Vec<String> = items.iter().take(cap).map(|m| format!("- {m}")).collect();
    format!("{header}\n{}", bullets.join("\n"))
}
