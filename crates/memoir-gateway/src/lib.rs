// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway: bearer-token auth, account/thread/project CRUD, and the
//! chat endpoints (JSON and SSE) that delegate to the turn orchestrator.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;
pub mod sse;

pub use auth::{AuthService, AuthUser};
pub use server::{GatewayState, router, start_server};
