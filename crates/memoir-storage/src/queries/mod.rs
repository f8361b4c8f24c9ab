// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules, one per entity.

pub mod messages;
pub mod projects;
pub mod threads;
pub mod users;
