// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User CRUD operations.

use memoir_core::MemoirError;
use rusqlite::{OptionalExtension, params};

use crate::database::Database;
use crate::models::User;

fn row_to_user(row: &rusqlite::Row<'_>) -> Result<User, rusqlite::Error> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        openai_key: row.get(3)?,
        anthropic_key: row.get(4)?,
        google_key: row.get(5)?,
        tavily_key: row.get(6)?,
        default_provider: row.get(7)?,
        location: row.get(8)?,
        name: row.get(9)?,
        occupation: row.get(10)?,
        created_at: row.get(11)?,
    })
}

const USER_COLUMNS: &str = "id, email, password_hash, openai_key, anthropic_key, google_key,
    tavily_key, default_provider, location, name, occupation, created_at";

/// Insert a new user.
pub async fn create_user(db: &Database, user: &User) -> Result<(), MemoirError> {
    let user = user.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO users (id, email, password_hash, openai_key, anthropic_key,
                 google_key, tavily_key, default_provider, location, name, occupation, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    user.id,
                    user.email,
                    user.password_hash,
                    user.openai_key,
                    user.anthropic_key,
                    user.google_key,
                    user.tavily_key,
                    user.default_provider,
                    user.location,
                    user.name,
                    user.occupation,
                    user.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Look a user up by email (login path).
pub async fn get_user_by_email(db: &Database, email: &str) -> Result<Option<User>, MemoirError> {
    let email = email.to_string();
    db.connection()
        .call(move |conn| {
            let user = conn
                .query_row(
                    &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                    params![email],
                    row_to_user,
                )
                .optional()?;
            Ok(user)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Look a user up by id (token path).
pub async fn get_user_by_id(db: &Database, id: &str) -> Result<Option<User>, MemoirError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let user = conn
                .query_row(
                    &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                    params![id],
                    row_to_user,
                )
                .optional()?;
            Ok(user)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Update a user's provider API keys. `None` fields are left unchanged.
pub async fn update_user_keys(
    db: &Database,
    user_id: &str,
    openai: Option<String>,
    anthropic: Option<String>,
    google: Option<String>,
    tavily: Option<String>,
    default_provider: Option<String>,
) -> Result<(), MemoirError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE users SET
                     openai_key = COALESCE(?2, openai_key),
                     anthropic_key = COALESCE(?3, anthropic_key),
                     google_key = COALESCE(?4, google_key),
                     tavily_key = COALESCE(?5, tavily_key),
                     default_provider = COALESCE(?6, default_provider)
                 WHERE id = ?1",
                params![user_id, openai, anthropic, google, tavily, default_provider],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Update a user's profile fields. `None` fields are left unchanged.
pub async fn update_user_profile(
    db: &Database,
    user_id: &str,
    name: Option<String>,
    occupation: Option<String>,
    location: Option<String>,
) -> Result<(), MemoirError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE users SET
                     name = COALESCE(?2, name),
                     occupation = COALESCE(?3, occupation),
                     location = COALESCE(?4, location)
                 WHERE id = ?1",
                params![user_id, name, occupation, location],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
