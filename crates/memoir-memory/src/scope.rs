// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Maps (user, project) context onto memory-service namespaces.
//!
//! Personal threads live in a per-user namespace; project threads share
//! one application-wide namespace partitioned per project, so every
//! member of a project reads and writes the same memory space.

/// Shared namespace for project (team) memory.
const APP_NAMESPACE: &str = "memoir";

/// Addressing pair for the external memory service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryScope {
    pub namespace_id: String,
    pub partition_id: String,
}

/// Resolves the memory scope for a turn. Pure and deterministic.
pub fn resolve_scope(user_id: &str, project_id: Option<&str>) -> MemoryScope {
    match project_id {
        None => MemoryScope {
            namespace_id: format!("user-{user_id}"),
            partition_id: "personal".to_string(),
        },
        Some(project_id) => MemoryScope {
            namespace_id: APP_NAMESPACE.to_string(),
            partition_id: format!("proj-{project_id}"),
        },
    }
}
