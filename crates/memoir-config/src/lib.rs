// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the Memoir chat backend.
//!
//! Layered loading (defaults, system file, XDG file, local file, `MEMOIR_*`
//! environment variables) via Figment, with serde models that reject unknown
//! keys at startup.

pub mod loader;
pub mod model;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{ChatConfig, MemoirConfig};
