// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes and shared state. Auth is per-handler via the
//! [`crate::auth::AuthUser`] extractor; `/health` and the `/auth/*`
//! routes are the only unauthenticated surface.

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use memoir_agent::TurnOrchestrator;
use memoir_config::ChatConfig;
use memoir_core::MemoirError;
use memoir_memory::MemoryClient;
use memoir_storage::Database;
use tower_http::cors::CorsLayer;

use crate::auth::AuthService;
use crate::handlers;
use crate::sse;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub db: Database,
    pub memory: MemoryClient,
    pub orchestrator: Arc<TurnOrchestrator>,
    pub auth: Arc<AuthService>,
    pub chat: ChatConfig,
}

/// Builds the full route table over the given state.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/auth/signup", post(handlers::signup))
        .route("/auth/login", post(handlers::login))
        .route(
            "/threads",
            get(handlers::list_threads).post(handlers::create_thread),
        )
        .route("/threads/{id}", delete(handlers::delete_thread))
        .route("/threads/{id}/messages", get(handlers::list_thread_messages))
        .route("/projects", post(handlers::create_project))
        .route("/projects/{id}/members", post(handlers::add_project_member))
        .route("/settings/keys", put(handlers::update_keys))
        .route("/settings/profile", put(handlers::update_profile))
        .route("/chat", post(handlers::chat))
        .route("/chat/stream", post(sse::chat_stream))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds and serves the gateway until ctrl-c.
pub async fn start_server(host: &str, port: u16, state: GatewayState) -> Result<(), MemoirError> {
    let app = router(state);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| MemoirError::Internal(format!("failed to bind {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| MemoirError::Internal(format!("gateway server error: {e}")))
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(e) => tracing::warn!(error = %e, "failed to listen for shutdown signal"),
    }
}
