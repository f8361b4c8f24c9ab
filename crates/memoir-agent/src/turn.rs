// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-turn orchestration pipeline.
//!
//! A turn moves through a fixed sequence: access check, context
//! gathering, prompt composition, user-message persistence, completion
//! dispatch, then post-completion persistence. The user message is
//! flushed to storage before the provider call so a failed completion
//! never loses what the user typed. Memory and web-search collaborators
//! are fail-open throughout; only access, credential, storage, and
//! completion errors abort a turn.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use memoir_config::ChatConfig;
use memoir_context::{PromptSections, compose};
use memoir_core::{
    ChatMessage, ChunkStream, CompletionRequest, MemoirError, Provider, Role, TokenUsage,
};
use memoir_memory::{FactExtractor, MemoryClient, MemoryScope, partition_by_thread, resolve_scope};
use memoir_storage::queries::{messages, projects, threads, users};
use memoir_storage::{Database, MessageRecord, Thread, User};
use memoir_websearch::{WebSearchClient, format_for_prompt};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::dispatch::{BaseUrlOverrides, UserKeys, build_provider, select_provider};
use crate::trigger::should_search;

/// Document chunks written to semantic memory are bounded so retrieval
/// returns focused passages rather than whole files.
const DOCUMENT_CHUNK_CHARS: usize = 1000;

/// Episodic search breadth per turn; the composer caps what survives
/// into the prompt.
const MEMORY_SEARCH_LIMIT: u32 = 100;

/// Where a turn currently sits in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Received,
    AccessChecked,
    ContextGathered,
    PromptComposed,
    CompletionInFlight,
    Persisted,
    Done,
    Error,
}

impl std::fmt::Display for TurnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TurnState::Received => "received",
            TurnState::AccessChecked => "access_checked",
            TurnState::ContextGathered => "context_gathered",
            TurnState::PromptComposed => "prompt_composed",
            TurnState::CompletionInFlight => "completion_in_flight",
            TurnState::Persisted => "persisted",
            TurnState::Done => "done",
            TurnState::Error => "error",
        };
        write!(f, "{s}")
    }
}

/// One incoming chat turn.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub user_id: String,
    pub thread_id: String,
    pub message: String,
    /// Optional pasted/uploaded document accompanying the message.
    pub document_text: Option<String>,
    /// Per-turn model override; `None` uses the thread's active model.
    pub model: Option<String>,
}

/// The completed turn as returned to the caller.
#[derive(Debug, Clone)]
pub struct TurnReply {
    pub content: String,
    pub model: String,
    pub provider: Provider,
    pub usage: TokenUsage,
    /// Id of the persisted assistant message.
    pub message_id: String,
}

/// Deferred post-completion persistence.
///
/// Streaming callers accumulate deltas and call [`TurnCommit::commit`]
/// once the stream ends (or breaks mid-way, committing the partial
/// text). The user message is already durable by the time this exists.
pub struct TurnCommit {
    db: Database,
    memory: MemoryClient,
    extractor: Arc<dyn FactExtractor>,
    scope: MemoryScope,
    thread_id: String,
    user_id: String,
    user_message: String,
    model: String,
    provider: Provider,
}

impl TurnCommit {
    /// Persists the assistant reply, updates thread bookkeeping, and
    /// writes both turns plus any extracted facts to memory. Memory
    /// writes are fail-open; storage failures propagate.
    pub async fn commit(
        self,
        reply: &str,
        usage: Option<TokenUsage>,
    ) -> Result<TurnReply, MemoirError> {
        let now = Utc::now().to_rfc3339();
        let message_id = Uuid::new_v4().to_string();

        let record = MessageRecord {
            id: message_id.clone(),
            thread_id: self.thread_id.clone(),
            sender: "assistant".to_string(),
            content: reply.to_string(),
            model_used: self.model.clone(),
            provider_used: self.provider.to_string(),
            prompt_tokens: usage.map(|u| i64::from(u.prompt_tokens)),
            completion_tokens: usage.map(|u| i64::from(u.completion_tokens)),
            created_at: now,
        };
        messages::insert_assistant_turn(&self.db, &record).await?;
        debug!(state = %TurnState::Persisted, thread_id = %self.thread_id, "turn advanced");

        let none = BTreeMap::new();
        self.memory
            .write_episodic(
                &self.scope,
                &self.thread_id,
                &self.user_id,
                "user",
                &self.user_message,
                &none,
            )
            .await;
        self.memory
            .write_episodic(&self.scope, &self.thread_id, &self.user_id, "assistant", reply, &none)
            .await;

        for fact in self.extractor.extract(&self.user_message, reply) {
            let mut metadata = BTreeMap::new();
            metadata.insert("category".to_string(), "user_fact".to_string());
            metadata.insert("thread_id".to_string(), self.thread_id.clone());
            self.memory
                .write_semantic(&self.scope, &self.user_id, &fact, &metadata)
                .await;
        }

        debug!(state = %TurnState::Done, thread_id = %self.thread_id, "turn advanced");
        Ok(TurnReply {
            content: reply.to_string(),
            model: self.model,
            provider: self.provider,
            usage: usage.unwrap_or_default(),
            message_id,
        })
    }
}

struct PreparedTurn {
    provider: Box<dyn memoir_core::CompletionProvider>,
    completion: CompletionRequest,
    commit: TurnCommit,
}

/// Drives turns end to end against storage, memory, search, and the
/// completion providers.
pub struct TurnOrchestrator {
    db: Database,
    memory: MemoryClient,
    websearch: WebSearchClient,
    extractor: Arc<dyn FactExtractor>,
    chat: ChatConfig,
    max_search_results: u32,
    overrides: BaseUrlOverrides,
}

impl TurnOrchestrator {
    pub fn new(
        db: Database,
        memory: MemoryClient,
        websearch: WebSearchClient,
        extractor: Arc<dyn FactExtractor>,
        chat: ChatConfig,
        max_search_results: u32,
    ) -> Self {
        Self {
            db,
            memory,
            websearch,
            extractor,
            chat,
            max_search_results,
            overrides: BaseUrlOverrides::default(),
        }
    }

    /// Overrides provider base URLs (proxies, tests).
    pub fn with_base_urls(mut self, overrides: BaseUrlOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Runs one non-streaming turn.
    pub async fn run_turn(&self, request: TurnRequest) -> Result<TurnReply, MemoirError> {
        let prepared = self.prepare(request, false).await?;
        debug!(
            state = %TurnState::CompletionInFlight,
            model = %prepared.completion.model,
            "turn advanced"
        );
        let response = match prepared.provider.complete(prepared.completion).await {
            Ok(r) => r,
            Err(e) => {
                // The user message persisted before dispatch stays durable.
                warn!(state = %TurnState::Error, error = %e, "completion failed");
                return Err(e);
            }
        };
        prepared.commit.commit(&response.content, Some(response.usage)).await
    }

    /// Runs one streaming turn. The caller forwards the chunk stream,
    /// accumulates deltas, and invokes the commit with the full (or, on
    /// a broken stream, partial) reply text.
    pub async fn run_turn_stream(
        &self,
        request: TurnRequest,
    ) -> Result<(ChunkStream, TurnCommit), MemoirError> {
        let prepared = self.prepare(request, true).await?;
        debug!(
            state = %TurnState::CompletionInFlight,
            model = %prepared.completion.model,
            "turn advanced"
        );
        let stream = prepared.provider.stream(prepared.completion).await?;
        Ok((stream, prepared.commit))
    }

    async fn prepare(&self, request: TurnRequest, stream: bool) -> Result<PreparedTurn, MemoirError> {
        debug!(state = %TurnState::Received, thread_id = %request.thread_id, "turn advanced");

        let user = users::get_user_by_id(&self.db, &request.user_id)
            .await?
            .ok_or_else(|| MemoirError::AccessDenied("unknown user".to_string()))?;
        let thread = self.authorized_thread(&user, &request.thread_id).await?;
        debug!(state = %TurnState::AccessChecked, thread_id = %thread.id, "turn advanced");

        let scope = resolve_scope(&request.user_id, thread.project_id.as_deref());
        let history = messages::list_messages_for_thread(&self.db, &thread.id).await?;

        let (documents, web_search, memories) = tokio::join!(
            self.ingest_document(&scope, &request),
            self.run_web_search(&user, &request.message),
            self.memory.search(&scope, &request.message, MEMORY_SEARCH_LIMIT, true, true),
        );
        debug!(
            state = %TurnState::ContextGathered,
            episodic = memories.episodic.len(),
            semantic = memories.semantic.len(),
            "turn advanced"
        );

        let (current, other) = partition_by_thread(memories.episodic, &thread.id);
        let sections = PromptSections {
            base_instructions: thread
                .system_prompt
                .clone()
                .or_else(|| self.chat.system_prompt.clone())
                .unwrap_or_default(),
            now: Utc::now(),
            user_location: user.location.clone(),
            profile_facts: memories.semantic.into_iter().map(|s| s.value).collect(),
            current_thread: current.into_iter().map(|h| h.content).collect(),
            other_thread: other.into_iter().map(|h| h.content).collect(),
            documents,
            web_search,
        };
        let system_prompt = compose(&sections);
        debug!(state = %TurnState::PromptComposed, chars = system_prompt.len(), "turn advanced");

        let model = request
            .model
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(&thread.active_model)
            .to_string();
        let keys = UserKeys {
            openai: user.openai_key.clone(),
            anthropic: user.anthropic_key.clone(),
            google: user.google_key.clone(),
        };
        let selection = select_provider(&model, &keys, self.default_provider(&user), &self.chat.default_model)?;
        let provider = build_provider(selection.provider, &selection.api_key, &self.overrides)?;

        let mut chat_messages: Vec<ChatMessage> = history
            .iter()
            .map(|m| ChatMessage {
                role: if m.sender == "user" { Role::User } else { Role::Assistant },
                content: m.content.clone(),
            })
            .collect();
        chat_messages.push(ChatMessage::user(&request.message));

        // The user message goes to storage before dispatch so a failed
        // completion never loses it.
        let user_record = MessageRecord {
            id: Uuid::new_v4().to_string(),
            thread_id: thread.id.clone(),
            sender: "user".to_string(),
            content: request.message.clone(),
            model_used: selection.model.clone(),
            provider_used: selection.provider.to_string(),
            prompt_tokens: None,
            completion_tokens: None,
            created_at: Utc::now().to_rfc3339(),
        };
        messages::insert_message(&self.db, &user_record).await?;

        let completion = CompletionRequest {
            model: selection.model.clone(),
            system_prompt,
            messages: chat_messages,
            temperature: thread.temperature,
            max_tokens: self.chat.max_tokens,
            stream,
        };

        Ok(PreparedTurn {
            provider,
            completion,
            commit: TurnCommit {
                db: self.db.clone(),
                memory: self.memory.clone(),
                extractor: Arc::clone(&self.extractor),
                scope,
                thread_id: thread.id,
                user_id: request.user_id,
                user_message: request.message,
                model: selection.model,
                provider: selection.provider,
            },
        })
    }

    /// Loads the thread and checks the acting user may post to it:
    /// thread owner, or member of the thread's project. Unknown threads
    /// are reported as access denials, not as missing resources.
    async fn authorized_thread(&self, user: &User, thread_id: &str) -> Result<Thread, MemoirError> {
        let thread = threads::get_thread(&self.db, thread_id)
            .await?
            .ok_or_else(|| MemoirError::AccessDenied("thread not accessible".to_string()))?;

        if thread.owner_user_id == user.id {
            return Ok(thread);
        }
        if let Some(project_id) = &thread.project_id
            && projects::is_member(&self.db, project_id, &user.id).await?
        {
            return Ok(thread);
        }
        Err(MemoirError::AccessDenied("thread not accessible".to_string()))
    }

    fn default_provider(&self, user: &User) -> Provider {
        Provider::from_str(&user.default_provider)
            .or_else(|_| Provider::from_str(&self.chat.default_provider))
            .unwrap_or(Provider::OpenAi)
    }

    /// Chunks an attached document into semantic memory and returns the
    /// chunks for the prompt's document section.
    async fn ingest_document(&self, scope: &MemoryScope, request: &TurnRequest) -> Vec<String> {
        let Some(text) = request.document_text.as_deref().filter(|t| !t.trim().is_empty()) else {
            return Vec::new();
        };
        let chunks = chunk_text(text, DOCUMENT_CHUNK_CHARS);
        for chunk in &chunks {
            let mut metadata = BTreeMap::new();
            metadata.insert("category".to_string(), "document".to_string());
            metadata.insert("thread_id".to_string(), request.thread_id.clone());
            self.memory
                .write_semantic(scope, &request.user_id, chunk, &metadata)
                .await;
        }
        debug!(chunks = chunks.len(), "document ingested");
        chunks
    }

    /// Runs a web search when the message asks for fresh information and
    /// the user has a search key. Returns the pre-formatted prompt block,
    /// empty when search did not run or found nothing.
    async fn run_web_search(&self, user: &User, message: &str) -> String {
        let Some(key) = user.tavily_key.as_deref().filter(|k| !k.is_empty()) else {
            return String::new();
        };
        if !should_search(message) {
            return String::new();
        }
        let response = self.websearch.search(key, message, self.max_search_results).await;
        if response.is_empty() {
            return String::new();
        }
        format_for_prompt(&response, user.location.as_deref())
    }
}

fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_chars)
        .map(|c| c.iter().collect::<String>().trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}
