// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP error mapping.
//!
//! Completion failures map to the status of their kind and surface the
//! kind's remediation message; everything else gets a generic body so
//! internal detail stays in the logs.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use memoir_core::{CompletionErrorKind, MemoirError};
use serde::Serialize;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Wrapper so handlers can `?` on [`MemoirError`].
pub struct ApiError(pub MemoirError);

impl From<MemoirError> for ApiError {
    fn from(err: MemoirError) -> Self {
        ApiError(err)
    }
}

pub fn status_for(err: &MemoirError) -> StatusCode {
    match err {
        MemoirError::AccessDenied(_) => StatusCode::FORBIDDEN,
        MemoirError::MissingCredential { .. } => StatusCode::BAD_REQUEST,
        MemoirError::Completion { kind, .. } => match kind {
            CompletionErrorKind::InvalidCredential => StatusCode::BAD_REQUEST,
            CompletionErrorKind::QuotaExceeded => StatusCode::PAYMENT_REQUIRED,
            CompletionErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            CompletionErrorKind::ModelUnavailable => StatusCode::NOT_FOUND,
            CompletionErrorKind::Other => StatusCode::INTERNAL_SERVER_ERROR,
        },
        MemoirError::Config(_)
        | MemoirError::Storage { .. }
        | MemoirError::Upstream { .. }
        | MemoirError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// User-facing message for an error. Completion failures get their
/// kind's remediation text; server-side failures stay opaque.
pub fn message_for(err: &MemoirError) -> String {
    match err {
        MemoirError::Completion { kind, .. } => kind.user_message().to_string(),
        MemoirError::AccessDenied(_) | MemoirError::MissingCredential { .. } => err.to_string(),
        _ => "internal server error".to_string(),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        } else {
            tracing::debug!(error = %self.0, status = %status, "request rejected");
        }
        (
            status,
            Json(ErrorResponse {
                error: message_for(&self.0),
            }),
        )
            .into_response()
    }
}
