// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Memoir chat backend.
//!
//! Provides the error taxonomy, common conversation types, the provider
//! enum with model-name detection, and the [`CompletionProvider`] trait
//! implemented by each vendor crate.

pub mod error;
pub mod provider;
pub mod types;

pub use error::{CompletionErrorKind, MemoirError};
pub use provider::{ChunkStream, CompletionProvider};
pub use types::{
    ChatMessage, CompletionChunk, CompletionRequest, CompletionResponse, Provider, Role,
    TokenUsage,
};
