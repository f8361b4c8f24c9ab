// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Thread CRUD operations.

use memoir_core::MemoirError;
use rusqlite::{OptionalExtension, params};

use crate::database::Database;
use crate::models::Thread;

fn row_to_thread(row: &rusqlite::Row<'_>) -> Result<Thread, rusqlite::Error> {
    Ok(Thread {
        id: row.get(0)?,
        title: row.get(1)?,
        owner_user_id: row.get(2)?,
        project_id: row.get(3)?,
        active_model: row.get(4)?,
        active_provider: row.get(5)?,
        temperature: row.get(6)?,
        system_prompt: row.get(7)?,
        created_at: row.get(8)?,
        last_message_at: row.get(9)?,
    })
}

const THREAD_COLUMNS: &str = "id, title, owner_user_id, project_id, active_model,
    active_provider, temperature, system_prompt, created_at, last_message_at";

/// Insert a new thread.
pub async fn create_thread(db: &Database, thread: &Thread) -> Result<(), MemoirError> {
    let thread = thread.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO threads (id, title, owner_user_id, project_id, active_model,
                 active_provider, temperature, system_prompt, created_at, last_message_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    thread.id,
                    thread.title,
                    thread.owner_user_id,
                    thread.project_id,
                    thread.active_model,
                    thread.active_provider,
                    thread.temperature,
                    thread.system_prompt,
                    thread.created_at,
                    thread.last_message_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch one thread.
pub async fn get_thread(db: &Database, id: &str) -> Result<Option<Thread>, MemoirError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let thread = conn
                .query_row(
                    &format!("SELECT {THREAD_COLUMNS} FROM threads WHERE id = ?1"),
                    params![id],
                    row_to_thread,
                )
                .optional()?;
            Ok(thread)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List threads visible to a user: owned personal threads plus threads in
/// projects the user belongs to, most recently active first.
pub async fn list_threads_for_user(db: &Database, user_id: &str) -> Result<Vec<Thread>, MemoirError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {THREAD_COLUMNS} FROM threads
                 WHERE owner_user_id = ?1
                    OR project_id IN (SELECT project_id FROM project_members WHERE user_id = ?1)
                 ORDER BY last_message_at DESC"
            ))?;
            let rows = stmt.query_map(params![user_id], row_to_thread)?;
            let mut threads = Vec::new();
            for row in rows {
                threads.push(row?);
            }
            Ok(threads)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delete a thread; messages cascade.
pub async fn delete_thread(db: &Database, id: &str) -> Result<(), MemoirError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute("DELETE FROM threads WHERE id = ?1", params![id])?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::queries::messages::{insert_message, list_messages_for_thread};
    use crate::queries::users::create_user;
    use crate::queries::users::tests::make_user;
    use tempfile::tempdir;

    pub(crate) fn make_thread(id: &str, owner: &str) -> Thread {
        Thread {
            id: id.to_string(),
            title: "New chat".to_string(),
            owner_user_id: owner.to_string(),
            project_id: None,
            active_model: "gpt-4o-mini".to_string(),
            active_provider: "openai".to_string(),
            temperature: 1.0,
            system_prompt: None,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            last_message_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    async fn setup() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("t.db").to_str().unwrap())
            .await
            .unwrap();
        create_user(&db, &make_user("u1", "a@example.com")).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn create_get_and_list() {
        let (db, _dir) = setup().await;
        create_thread(&db, &make_thread("t1", "u1")).await.unwrap();

        let fetched = get_thread(&db, "t1").await.unwrap().unwrap();
        assert_eq!(fetched.owner_user_id, "u1");
        assert_eq!(fetched.temperature, 1.0);

        let listed = list_threads_for_user(&db, "u1").await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn delete_cascades_to_messages() {
        let (db, _dir) = setup().await;
        create_thread(&db, &make_thread("t1", "u1")).await.unwrap();

        let msg = crate::models::MessageRecord {
            id: "m1".to_string(),
            thread_id: "t1".to_string(),
            sender: "user".to_string(),
            content: "hello".to_string(),
            model_used: "gpt-4o-mini".to_string(),
            provider_used: "openai".to_string(),
            prompt_tokens: None,
            completion_tokens: None,
            created_at: "2026-01-01T00:00:01Z".to_string(),
        };
        insert_message(&db, &msg).await.unwrap();

        delete_thread(&db, "t1").await.unwrap();
        assert!(get_thread(&db, "t1").await.unwrap().is_none());
        let remaining = list_messages_for_thread(&db, "t1").await.unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn list_includes_project_threads_for_members() {
        let (db, _dir) = setup().await;
        create_user(&db, &make_user("u2", "b@example.com")).await.unwrap();

        let project = crate::models::Project {
            id: "p1".to_string(),
            name: "Shared".to_string(),
            description: None,
            owner_id: "u1".to_string(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
        };
        crate::queries::projects::create_project(&db, &project).await.unwrap();
        crate::queries::projects::add_member(
            &db,
            &crate::models::ProjectMember {
                project_id: "p1".to_string(),
                user_id: "u2".to_string(),
                role: "member".to_string(),
                created_at: "2026-01-01T00:00:00Z".to_string(),
            },
        )
        .await
        .unwrap();

        let mut thread = make_thread("t-proj", "u1");
        thread.project_id = Some("p1".to_string());
        create_thread(&db, &thread).await.unwrap();

        // u2 does not own the thread but sees it via membership.
        let visible = list_threads_for_user(&db, "u2").await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, "t-proj");
    }
}
