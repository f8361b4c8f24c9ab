// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the REST API.
//!
//! Auth, thread and project CRUD, settings, and the JSON chat endpoint.
//! The SSE chat endpoint lives in [`crate::sse`].

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use memoir_agent::TurnRequest;
use memoir_core::{MemoirError, Provider, TokenUsage};
use memoir_memory::resolve_scope;
use memoir_storage::queries::{messages, projects, threads, users};
use memoir_storage::{Project, ProjectMember, Thread, User};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::{ApiError, ErrorResponse};
use crate::server::GatewayState;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateThreadRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct KeysRequest {
    #[serde(default)]
    pub openai_key: Option<String>,
    #[serde(default)]
    pub anthropic_key: Option<String>,
    #[serde(default)]
    pub google_key: Option<String>,
    #[serde(default)]
    pub tavily_key: Option<String>,
    #[serde(default)]
    pub default_provider: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatTurnRequest {
    pub thread_id: String,
    pub message: String,
    #[serde(default)]
    pub document_text: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatTurnResponse {
    pub content: String,
    pub model: String,
    pub provider: String,
    pub message_id: String,
    pub usage: TokenUsage,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// POST /auth/signup
///
/// Creates the account, an implicit personal thread, and (best-effort)
/// the personal memory scope.
pub async fn signup(
    State(state): State<GatewayState>,
    Json(body): Json<SignupRequest>,
) -> Result<Response, ApiError> {
    let email = body.email.trim().to_lowercase();
    if !email.contains('@') {
        return Ok(bad_request("a valid email address is required"));
    }
    if body.password.len() < 8 {
        return Ok(bad_request("password must be at least 8 characters"));
    }
    if users::get_user_by_email(&state.db, &email).await?.is_some() {
        return Ok((
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "an account with this email already exists".to_string(),
            }),
        )
            .into_response());
    }

    let user = User {
        id: Uuid::new_v4().to_string(),
        email,
        password_hash: state.auth.hash_password(&body.password)?,
        openai_key: None,
        anthropic_key: None,
        google_key: None,
        tavily_key: None,
        default_provider: state.chat.default_provider.clone(),
        location: None,
        name: None,
        occupation: None,
        created_at: Utc::now().to_rfc3339(),
    };
    users::create_user(&state.db, &user).await?;
    threads::create_thread(&state.db, &new_thread(&state, &user.id, None, None, None)).await?;

    // Memory scope creation is fail-open; the service may be down.
    let scope = resolve_scope(&user.id, None);
    state.memory.ensure_scope(&scope).await;

    tracing::info!(user_id = %user.id, "account created");
    let token = state.auth.issue_token(&user.id);
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user_id: user.id,
        }),
    )
        .into_response())
}

/// POST /auth/login
pub async fn login(
    State(state): State<GatewayState>,
    Json(body): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let email = body.email.trim().to_lowercase();
    let rejected = || {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "invalid email or password".to_string(),
            }),
        )
            .into_response()
    };

    let Some(user) = users::get_user_by_email(&state.db, &email).await? else {
        return Ok(rejected());
    };
    if !state.auth.verify_password(&body.password, &user.password_hash) {
        return Ok(rejected());
    }

    let token = state.auth.issue_token(&user.id);
    Ok(Json(AuthResponse {
        token,
        user_id: user.id,
    })
    .into_response())
}

/// GET /threads
pub async fn list_threads(
    State(state): State<GatewayState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Thread>>, ApiError> {
    Ok(Json(threads::list_threads_for_user(&state.db, &user.id).await?))
}

/// POST /threads
pub async fn create_thread(
    State(state): State<GatewayState>,
    AuthUser(user): AuthUser,
    Json(body): Json<CreateThreadRequest>,
) -> Result<Response, ApiError> {
    if let Some(project_id) = &body.project_id
        && !projects::is_member(&state.db, project_id, &user.id).await?
    {
        return Err(MemoirError::AccessDenied("not a project member".to_string()).into());
    }

    let mut thread = new_thread(
        &state,
        &user.id,
        body.title.as_deref(),
        body.project_id.clone(),
        body.model.as_deref(),
    );
    thread.system_prompt = body.system_prompt;
    threads::create_thread(&state.db, &thread).await?;
    Ok((StatusCode::CREATED, Json(thread)).into_response())
}

/// DELETE /threads/{id}
///
/// Owner only. Memory is left untouched: the scope is shared across
/// threads, so thread deletion must not delete remote memories.
pub async fn delete_thread(
    State(state): State<GatewayState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let thread = threads::get_thread(&state.db, &id)
        .await?
        .ok_or_else(|| MemoirError::AccessDenied("thread not accessible".to_string()))?;
    if thread.owner_user_id != user.id {
        return Err(MemoirError::AccessDenied("thread not accessible".to_string()).into());
    }
    threads::delete_thread(&state.db, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /threads/{id}/messages
pub async fn list_thread_messages(
    State(state): State<GatewayState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<memoir_storage::MessageRecord>>, ApiError> {
    accessible_thread(&state, &user, &id).await?;
    Ok(Json(messages::list_messages_for_thread(&state.db, &id).await?))
}

/// POST /projects
pub async fn create_project(
    State(state): State<GatewayState>,
    AuthUser(user): AuthUser,
    Json(body): Json<CreateProjectRequest>,
) -> Result<Response, ApiError> {
    if body.name.trim().is_empty() {
        return Ok(bad_request("project name is required"));
    }
    let project = Project {
        id: Uuid::new_v4().to_string(),
        name: body.name.trim().to_string(),
        description: body.description,
        owner_id: user.id,
        created_at: Utc::now().to_rfc3339(),
    };
    projects::create_project(&state.db, &project).await?;

    // The shared scope is ensured up front, fail-open, so later
    // project-thread memory writes land in an existing namespace.
    let scope = resolve_scope(&project.owner_id, Some(&project.id));
    state.memory.ensure_scope(&scope).await;

    Ok((StatusCode::CREATED, Json(project)).into_response())
}

/// POST /projects/{id}/members
///
/// Project owner only.
pub async fn add_project_member(
    State(state): State<GatewayState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<AddMemberRequest>,
) -> Result<StatusCode, ApiError> {
    let project = projects::get_project(&state.db, &id)
        .await?
        .ok_or_else(|| MemoirError::AccessDenied("project not accessible".to_string()))?;
    if project.owner_id != user.id {
        return Err(MemoirError::AccessDenied("only the project owner can add members".to_string()).into());
    }

    projects::add_member(
        &state.db,
        &ProjectMember {
            project_id: id,
            user_id: body.user_id,
            role: body.role.unwrap_or_else(|| "member".to_string()),
            created_at: Utc::now().to_rfc3339(),
        },
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /settings/keys
pub async fn update_keys(
    State(state): State<GatewayState>,
    AuthUser(user): AuthUser,
    Json(body): Json<KeysRequest>,
) -> Result<StatusCode, ApiError> {
    users::update_user_keys(
        &state.db,
        &user.id,
        body.openai_key,
        body.anthropic_key,
        body.google_key,
        body.tavily_key,
        body.default_provider,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /settings/profile
pub async fn update_profile(
    State(state): State<GatewayState>,
    AuthUser(user): AuthUser,
    Json(body): Json<ProfileRequest>,
) -> Result<StatusCode, ApiError> {
    users::update_user_profile(&state.db, &user.id, body.name, body.occupation, body.location)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /chat
pub async fn chat(
    State(state): State<GatewayState>,
    AuthUser(user): AuthUser,
    Json(body): Json<ChatTurnRequest>,
) -> Result<Json<ChatTurnResponse>, ApiError> {
    let reply = state
        .orchestrator
        .run_turn(TurnRequest {
            user_id: user.id,
            thread_id: body.thread_id,
            message: body.message,
            document_text: body.document_text,
            model: body.model,
        })
        .await?;
    Ok(Json(ChatTurnResponse {
        content: reply.content,
        model: reply.model,
        provider: reply.provider.to_string(),
        message_id: reply.message_id,
        usage: reply.usage,
    }))
}

/// GET /health
pub async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Loads a thread the user may read: owner, or member of its project.
async fn accessible_thread(
    state: &GatewayState,
    user: &User,
    thread_id: &str,
) -> Result<Thread, MemoirError> {
    let thread = threads::get_thread(&state.db, thread_id)
        .await?
        .ok_or_else(|| MemoirError::AccessDenied("thread not accessible".to_string()))?;
    if thread.owner_user_id == user.id {
        return Ok(thread);
    }
    if let Some(project_id) = &thread.project_id
        && projects::is_member(&state.db, project_id, &user.id).await?
    {
        return Ok(thread);
    }
    Err(MemoirError::AccessDenied("thread not accessible".to_string()))
}

fn new_thread(
    state: &GatewayState,
    owner_id: &str,
    title: Option<&str>,
    project_id: Option<String>,
    model: Option<&str>,
) -> Thread {
    let model = model
        .filter(|m| !m.is_empty())
        .unwrap_or(&state.chat.default_model)
        .to_string();
    let provider = Provider::from_model(&model)
        .map(|p| p.to_string())
        .unwrap_or_else(|| state.chat.default_provider.clone());
    let now = Utc::now().to_rfc3339();
    Thread {
        id: Uuid::new_v4().to_string(),
        title: title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or("New chat")
            .to_string(),
        owner_user_id: owner_id.to_string(),
        project_id,
        active_model: model,
        active_provider: provider,
        temperature: 1.0,
        system_prompt: None,
        created_at: now.clone(),
        last_message_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_request_deserializes() {
        let req: SignupRequest =
            serde_json::from_str(r#"{"email": "a@b.co", "password": "longenough"}"#).unwrap();
        assert_eq!(req.email, "a@b.co");
    }

    #[test]
    fn chat_request_optionals_default() {
        let req: ChatTurnRequest =
            serde_json::from_str(r#"{"thread_id": "t1", "message": "hi"}"#).unwrap();
        assert!(req.document_text.is_none());
        assert!(req.model.is_none());
    }

    #[test]
    fn keys_request_accepts_partial_updates() {
        let req: KeysRequest = serde_json::from_str(r#"{"openai_key": "sk-x"}"#).unwrap();
        assert_eq!(req.openai_key.as_deref(), Some("sk-x"));
        assert!(req.anthropic_key.is_none());
        assert!(req.default_provider.is_none());
    }

    #[test]
    fn chat_response_serializes_usage() {
        let resp = ChatTurnResponse {
            content: "hello".into(),
            model: "gpt-4o-mini".into(),
            provider: "openai".into(),
            message_id: "m1".into(),
            usage: TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 3,
            },
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"prompt_tokens\":10"));
        assert!(json.contains("\"provider\":\"openai\""));
    }
}
