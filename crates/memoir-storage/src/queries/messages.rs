// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message persistence. Messages are append-only; edits are not supported.

use memoir_core::MemoirError;
use rusqlite::params;

use crate::database::Database;
use crate::models::MessageRecord;

fn row_to_message(row: &rusqlite::Row<'_>) -> Result<MessageRecord, rusqlite::Error> {
    Ok(MessageRecord {
        id: row.get(0)?,
        thread_id: row.get(1)?,
        sender: row.get(2)?,
        content: row.get(3)?,
        model_used: row.get(4)?,
        provider_used: row.get(5)?,
        prompt_tokens: row.get(6)?,
        completion_tokens: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// Append a message to its thread.
pub async fn insert_message(db: &Database, message: &MessageRecord) -> Result<(), MemoirError> {
    let message = message.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (id, thread_id, sender, content, model_used,
                 provider_used, prompt_tokens, completion_tokens, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    message.id,
                    message.thread_id,
                    message.sender,
                    message.content,
                    message.model_used,
                    message.provider_used,
                    message.prompt_tokens,
                    message.completion_tokens,
                    message.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Append the assistant message and bump its thread's active model,
/// provider, and activity timestamp in one transaction, so the thread
/// row never drifts out of sync with its messages.
pub async fn insert_assistant_turn(
    db: &Database,
    message: &MessageRecord,
) -> Result<(), MemoirError> {
    let message = message.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO messages (id, thread_id, sender, content, model_used,
                 provider_used, prompt_tokens, completion_tokens, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    message.id,
                    message.thread_id,
                    message.sender,
                    message.content,
                    message.model_used,
                    message.provider_used,
                    message.prompt_tokens,
                    message.completion_tokens,
                    message.created_at,
                ],
            )?;
            tx.execute(
                "UPDATE threads SET active_model = ?2, active_provider = ?3, last_message_at = ?4
                 WHERE id = ?1",
                params![
                    message.thread_id,
                    message.model_used,
                    message.provider_used,
                    message.created_at,
                ],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All messages in a thread, oldest first.
pub async fn list_messages_for_thread(
    db: &Database,
    thread_id: &str,
) -> Result<Vec<MessageRecord>, MemoirError> {
    let thread_id = thread_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, thread_id, sender, content, model_used, provider_used,
                        prompt_tokens, completion_tokens, created_at
                 FROM messages WHERE thread_id = ?1 ORDER BY created_at ASC",
            )?;
            let rows = stmt.query_map(params![thread_id], row_to_message)?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::threads::create_thread;
    use crate::queries::threads::tests::make_thread;
    use crate::queries::users::create_user;
    use crate::queries::users::tests::make_user;
    use tempfile::tempdir;

    fn make_message(id: &str, thread: &str, sender: &str, at: &str) -> MessageRecord {
        MessageRecord {
            id: id.to_string(),
            thread_id: thread.to_string(),
            sender: sender.to_string(),
            content: format!("content of {id}"),
            model_used: "gpt-4o-mini".to_string(),
            provider_used: "openai".to_string(),
            prompt_tokens: None,
            completion_tokens: None,
            created_at: at.to_string(),
        }
    }

    async fn setup() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("m.db").to_str().unwrap())
            .await
            .unwrap();
        create_user(&db, &make_user("u1", "a@example.com")).await.unwrap();
        create_thread(&db, &make_thread("t1", "u1")).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn messages_come_back_oldest_first() {
        let (db, _dir) = setup().await;
        insert_message(&db, &make_message("m2", "t1", "assistant", "2026-01-01T00:00:02Z"))
            .await
            .unwrap();
        insert_message(&db, &make_message("m1", "t1", "user", "2026-01-01T00:00:01Z"))
            .await
            .unwrap();

        let messages = list_messages_for_thread(&db, "t1").await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].id, "m1");
        assert_eq!(messages[1].id, "m2");
    }

    #[tokio::test]
    async fn insert_requires_existing_thread() {
        let (db, _dir) = setup().await;
        let result =
            insert_message(&db, &make_message("m1", "no-such-thread", "user", "2026-01-01T00:00:01Z"))
                .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn assistant_turn_updates_thread_atomically() {
        let (db, _dir) = setup().await;
        let mut msg = make_message("m1", "t1", "assistant", "2026-01-02T12:00:00Z");
        msg.model_used = "claude-3-5-haiku-20241022".to_string();
        msg.provider_used = "anthropic".to_string();
        insert_assistant_turn(&db, &msg).await.unwrap();

        let thread = crate::queries::threads::get_thread(&db, "t1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(thread.active_model, "claude-3-5-haiku-20241022");
        assert_eq!(thread.active_provider, "anthropic");
        assert_eq!(thread.last_message_at, "2026-01-02T12:00:00Z");

        // A failed insert (duplicate id) rolls back; the thread keeps its
        // previous activity timestamp.
        let dup = make_message("m1", "t1", "assistant", "2026-02-01T00:00:00Z");
        assert!(insert_assistant_turn(&db, &dup).await.is_err());
        let thread = crate::queries::threads::get_thread(&db, "t1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(thread.last_message_at, "2026-01-02T12:00:00Z");
    }

    #[tokio::test]
    async fn token_usage_round_trips() {
        let (db, _dir) = setup().await;
        let mut msg = make_message("m1", "t1", "assistant", "2026-01-01T00:00:01Z");
        msg.prompt_tokens = Some(120);
        msg.completion_tokens = Some(48);
        insert_message(&db, &msg).await.unwrap();

        let messages = list_messages_for_thread(&db, "t1").await.unwrap();
        assert_eq!(messages[0].prompt_tokens, Some(120));
        assert_eq!(messages[0].completion_tokens, Some(48));
    }
}
