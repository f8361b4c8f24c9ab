// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `memoir serve` command implementation.
//!
//! Wires storage, the memory and web-search clients, the turn
//! orchestrator, and the HTTP gateway together, then serves until
//! ctrl-c.

use std::sync::Arc;

use memoir_agent::TurnOrchestrator;
use memoir_config::MemoirConfig;
use memoir_core::MemoirError;
use memoir_gateway::{AuthService, GatewayState, start_server};
use memoir_memory::{MemoryClient, PatternFactExtractor};
use memoir_storage::Database;
use memoir_websearch::WebSearchClient;
use tracing::info;

/// Runs the `memoir serve` command.
pub async fn run_serve(config: MemoirConfig) -> Result<(), MemoirError> {
    init_tracing(&config.log.level);
    info!("starting memoir serve");

    let db = Database::open(&config.storage.database_path).await?;
    info!(path = %config.storage.database_path, "storage ready");

    let memory = MemoryClient::new(
        config.memory.base_url.clone(),
        config.memory.request_timeout_secs,
        config.memory.search_timeout_secs,
    )?;
    let websearch = WebSearchClient::new(config.websearch.base_url.clone())?;

    let orchestrator = TurnOrchestrator::new(
        db.clone(),
        memory.clone(),
        websearch,
        Arc::new(PatternFactExtractor),
        config.chat.clone(),
        config.websearch.max_results,
    );

    let state = GatewayState {
        db,
        memory,
        orchestrator: Arc::new(orchestrator),
        auth: Arc::new(AuthService::new(
            config.auth.token_secret.clone(),
            config.auth.token_ttl_secs,
        )),
        chat: config.chat.clone(),
    };

    start_server(&config.server.host, config.server.port, state).await
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("memoir={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
