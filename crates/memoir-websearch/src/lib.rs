// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Web search for grounding answers in live data.
//!
//! The client is fail-open like the memory client: search augments a
//! turn, it never blocks one, so every failure collapses to the empty
//! response sentinel.

pub mod client;
pub mod format;

pub use client::{WebSearchClient, WebSearchResponse, WebSearchResult};
pub use format::format_for_prompt;
