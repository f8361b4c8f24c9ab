// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turn orchestration: provider dispatch, search triggering, and the
//! pipeline that carries a chat message from access check to persisted
//! reply.

pub mod dispatch;
pub mod trigger;
pub mod turn;

pub use dispatch::{BaseUrlOverrides, ProviderSelection, UserKeys, build_provider, select_provider};
pub use trigger::should_search;
pub use turn::{TurnCommit, TurnOrchestrator, TurnReply, TurnRequest, TurnState};
