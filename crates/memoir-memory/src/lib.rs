// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long-term memory: scope resolution, the memory-service client, and
//! heuristic fact extraction.

pub mod client;
pub mod extractor;
pub mod scope;
pub mod types;

pub use client::MemoryClient;
pub use extractor::{FactExtractor, PatternFactExtractor};
pub use scope::{MemoryScope, resolve_scope};
pub use types::{EpisodicHit, MemorySearchResults, SemanticHit, partition_by_thread};
