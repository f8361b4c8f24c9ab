// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Completion provider trait implemented by each vendor crate.

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::MemoirError;
use crate::types::{CompletionChunk, CompletionRequest, CompletionResponse, Provider};

/// A pinned, boxed stream of completion chunks.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<CompletionChunk, MemoirError>> + Send>>;

/// Uniform calling convention over the interchangeable LLM vendors.
///
/// Implementations normalize vendor wire formats into [`CompletionResponse`]
/// for whole replies and [`CompletionChunk`] sequences (terminated by
/// [`CompletionChunk::Done`]) for streamed replies.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Which vendor this implementation talks to.
    fn provider(&self) -> Provider;

    /// Sends a completion request and returns the full response.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, MemoirError>;

    /// Sends a completion request and returns a stream of content fragments.
    async fn stream(&self, request: CompletionRequest) -> Result<ChunkStream, MemoirError>;
}
