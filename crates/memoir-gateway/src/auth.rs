// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Password hashing and bearer-token auth.
//!
//! Passwords are argon2id hashes. Tokens are self-contained:
//! `{user_id}.{expiry}.{hmac-sha256(secret, "{user_id}.{expiry}")}` with
//! the signature hex-encoded, so validation needs no token store. When
//! no secret is configured an ephemeral one is generated at startup and
//! tokens do not survive restarts.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use axum::Json;
use axum::extract::FromRequestParts;
use axum::http::{StatusCode, request::Parts};
use hmac::{Hmac, Mac};
use memoir_core::MemoirError;
use memoir_storage::User;
use memoir_storage::queries::users;
use rand::RngCore;
use sha2::Sha256;

use crate::error::ErrorResponse;
use crate::server::GatewayState;

type HmacSha256 = Hmac<Sha256>;

/// Issues and validates tokens, hashes and verifies passwords.
pub struct AuthService {
    secret: Vec<u8>,
    ttl_secs: u64,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("secret", &"[redacted]")
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

impl AuthService {
    pub fn new(secret: Option<String>, ttl_secs: u64) -> Self {
        let secret = match secret {
            Some(s) if !s.is_empty() => s.into_bytes(),
            _ => {
                tracing::warn!("no token secret configured, using an ephemeral one");
                let mut bytes = vec![0u8; 32];
                rand::thread_rng().fill_bytes(&mut bytes);
                bytes
            }
        };
        Self { secret, ttl_secs }
    }

    pub fn hash_password(&self, password: &str) -> Result<String, MemoirError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| MemoirError::Internal(format!("password hashing failed: {e}")))
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    pub fn issue_token(&self, user_id: &str) -> String {
        let expiry = chrono::Utc::now().timestamp() + self.ttl_secs as i64;
        let payload = format!("{user_id}.{expiry}");
        format!("{payload}.{}", self.sign(&payload))
    }

    /// Returns the user id for a valid, unexpired token.
    pub fn validate_token(&self, token: &str) -> Option<String> {
        let mut parts = token.rsplitn(3, '.');
        let signature = parts.next()?;
        let expiry_str = parts.next()?;
        let user_id = parts.next()?;
        if user_id.is_empty() {
            return None;
        }

        let expiry: i64 = expiry_str.parse().ok()?;
        if expiry < chrono::Utc::now().timestamp() {
            return None;
        }

        let payload = format!("{user_id}.{expiry_str}");
        let sig_bytes = hex::decode(signature).ok()?;
        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        mac.verify_slice(&sig_bytes).ok()?;
        Some(user_id.to_string())
    }

    fn sign(&self, payload: &str) -> String {
        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts keys of any length")
    }
}

/// Extractor that validates the bearer token and loads the user.
pub struct AuthUser(pub User);

impl FromRequestParts<GatewayState> for AuthUser {
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &GatewayState,
    ) -> Result<Self, Self::Rejection> {
        let unauthorized = || {
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "invalid or missing bearer token".to_string(),
                }),
            )
        };

        let token = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(unauthorized)?;
        let user_id = state
            .auth
            .validate_token(token)
            .ok_or_else(unauthorized)?;

        let user = users::get_user_by_id(&state.db, &user_id)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "user lookup failed during auth");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: "storage unavailable".to_string(),
                    }),
                )
            })?
            .ok_or_else(unauthorized)?;
        Ok(AuthUser(user))
    }
}
