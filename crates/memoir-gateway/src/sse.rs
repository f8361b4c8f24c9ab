// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Server-Sent Events streaming for POST /chat/stream.
//!
//! Event format:
//! ```text
//! data: {"content": "partial text"}
//! data: {"content": "more text"}
//! data: [DONE]
//! ```
//! Errors arrive as `data: {"error": "..."}` followed by the `[DONE]`
//! sentinel. If the provider stream breaks mid-reply, whatever text
//! already streamed is committed to storage and memory before the
//! sentinel, so partial replies survive.

use std::convert::Infallible;

use axum::Json;
use axum::extract::State;
use axum::response::sse::{Event, Sse};
use futures::StreamExt;
use futures::stream::{self, Stream};
use memoir_agent::TurnRequest;
use memoir_core::{CompletionChunk, MemoirError};
use tokio::sync::mpsc;

use crate::auth::AuthUser;
use crate::error::message_for;
use crate::handlers::ChatTurnRequest;
use crate::server::GatewayState;

const DONE_SENTINEL: &str = "[DONE]";

fn content_event(delta: &str) -> Event {
    Event::default().data(serde_json::json!({ "content": delta }).to_string())
}

fn error_event(err: &MemoirError) -> Event {
    Event::default().data(serde_json::json!({ "error": message_for(err) }).to_string())
}

/// POST /chat/stream
pub async fn chat_stream(
    State(state): State<GatewayState>,
    AuthUser(user): AuthUser,
    Json(body): Json<ChatTurnRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel::<Event>(32);
    let orchestrator = state.orchestrator.clone();
    let request = TurnRequest {
        user_id: user.id,
        thread_id: body.thread_id,
        message: body.message,
        document_text: body.document_text,
        model: body.model,
    };

    tokio::spawn(async move {
        match orchestrator.run_turn_stream(request).await {
            Err(e) => {
                let _ = tx.send(error_event(&e)).await;
            }
            Ok((mut chunks, commit)) => {
                let mut text = String::new();
                let mut stream_error = false;
                while let Some(chunk) = chunks.next().await {
                    match chunk {
                        Ok(CompletionChunk::Delta(delta)) => {
                            text.push_str(&delta);
                            // A closed channel means the client went away;
                            // keep draining so the reply still commits.
                            let _ = tx.send(content_event(&delta)).await;
                        }
                        Ok(CompletionChunk::Done) => break,
                        Err(e) => {
                            tracing::warn!(error = %e, "provider stream broke mid-reply");
                            let _ = tx.send(error_event(&e)).await;
                            stream_error = true;
                            break;
                        }
                    }
                }

                if !text.is_empty() {
                    // Streams carry no usage accounting.
                    if let Err(e) = commit.commit(&text, None).await {
                        tracing::warn!(error = %e, "post-stream persistence failed");
                        if !stream_error {
                            let _ = tx.send(error_event(&e)).await;
                        }
                    }
                }
            }
        }
        let _ = tx.send(Event::default().data(DONE_SENTINEL)).await;
    });

    let events = stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|event| (Ok::<_, Infallible>(event), rx))
    });
    Sse::new(events)
}
