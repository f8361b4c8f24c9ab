// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for accounts, projects, threads, and messages.
//!
//! A single [`Database`] handle wraps a tokio-rusqlite connection; query
//! functions live under [`queries`], one module per entity.

pub mod database;
pub mod models;
pub mod queries;

pub use database::Database;
pub use models::{MessageRecord, Project, ProjectMember, Thread, User};
