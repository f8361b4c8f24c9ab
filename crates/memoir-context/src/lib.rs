// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! System-prompt composition.
//!
//! One function, [`compose`], assembles the per-turn system prompt from
//! whatever context the orchestrator gathered. Section order is fixed
//! and capped so a noisy memory store cannot crowd out the user's own
//! instructions.

pub mod composer;

pub use composer::{
    MAX_CURRENT_THREAD, MAX_OTHER_THREAD, MAX_PROFILE_FACTS, PromptSections, compose,
};
