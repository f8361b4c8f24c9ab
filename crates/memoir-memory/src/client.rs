// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the external memory service.
//!
//! Every operation is fail-open: a chat turn must never be blocked by
//! memory-service downtime, so writes return `bool`, reads return empty
//! results, and failures are logged at warn level instead of propagated.

use std::collections::BTreeMap;
use std::time::Duration;

use memoir_core::MemoirError;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::scope::MemoryScope;
use crate::types::{EpisodicHit, MemorySearchResults, SemanticHit};

/// Client for the memory service's v2 HTTP API.
#[derive(Debug, Clone)]
pub struct MemoryClient {
    client: reqwest::Client,
    search_client: reqwest::Client,
    base_url: String,
}

impl MemoryClient {
    /// Creates a client. Search gets its own, longer timeout because
    /// reranked retrieval is slow compared to writes.
    pub fn new(
        base_url: String,
        request_timeout_secs: u64,
        search_timeout_secs: u64,
    ) -> Result<Self, MemoirError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(request_timeout_secs))
            .build()
            .map_err(|e| MemoirError::Internal(format!("failed to build HTTP client: {e}")))?;
        let search_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(search_timeout_secs))
            .build()
            .map_err(|e| MemoirError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            search_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Makes sure the scope exists on the service, creating it when the
    /// lookup misses. Returns false on any failure.
    pub async fn ensure_scope(&self, scope: &MemoryScope) -> bool {
        let lookup = json!({
            "org_id": scope.namespace_id,
            "project_id": scope.partition_id,
        });

        let found = self
            .client
            .post(format!("{}/api/v2/projects/get", self.base_url))
            .json(&lookup)
            .send()
            .await;

        match found {
            Ok(resp) if resp.status().is_success() => return true,
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "memory scope lookup failed");
                return false;
            }
        }

        let name = if scope.partition_id == "personal" {
            format!("Personal memory - {}", scope.namespace_id)
        } else {
            format!("Project memory - {}", scope.partition_id)
        };
        let create = json!({
            "org_id": scope.namespace_id,
            "project_id": scope.partition_id,
            "name": name,
            "description": format!("Memory space for {name}"),
        });

        match self
            .client
            .post(format!("{}/api/v2/projects", self.base_url))
            .json(&create)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => {
                debug!(
                    namespace = %scope.namespace_id,
                    partition = %scope.partition_id,
                    "created memory scope"
                );
                true
            }
            Ok(resp) => {
                warn!(status = %resp.status(), "memory scope creation rejected");
                false
            }
            Err(e) => {
                warn!(error = %e, "memory scope creation failed");
                false
            }
        }
    }

    /// Writes one conversation turn as an episodic memory.
    pub async fn write_episodic(
        &self,
        scope: &MemoryScope,
        thread_id: &str,
        user_id: &str,
        role: &str,
        text: &str,
        extra_metadata: &BTreeMap<String, String>,
    ) -> bool {
        let mut metadata = extra_metadata.clone();
        // The service requires string-valued metadata.
        metadata.insert("thread_id".to_string(), thread_id.to_string());
        metadata.insert("user_id".to_string(), user_id.to_string());
        metadata.insert("role".to_string(), role.to_string());
        metadata.insert("source".to_string(), "memoir".to_string());

        let payload = json!({
            "org_id": scope.namespace_id,
            "project_id": scope.partition_id,
            "messages": [{
                "content": text,
                "producer": if role == "user" { "user" } else { "assistant" },
                "produced_for": format!("thread-{thread_id}"),
                "role": role,
                "metadata": metadata,
            }],
        });

        self.post_and_swallow("/api/v2/memories", &payload, "episodic write")
            .await
    }

    /// Writes a long-term fact or document chunk as semantic memory.
    pub async fn write_semantic(
        &self,
        scope: &MemoryScope,
        user_id: &str,
        text: &str,
        extra_metadata: &BTreeMap<String, String>,
    ) -> bool {
        let mut metadata = extra_metadata.clone();
        metadata.insert("user_id".to_string(), user_id.to_string());
        metadata.insert("type".to_string(), "semantic".to_string());
        metadata.insert("source".to_string(), "memoir".to_string());

        let payload = json!({
            "org_id": scope.namespace_id,
            "project_id": scope.partition_id,
            "messages": [{
                "content": text,
                "producer": "system",
                "produced_for": format!("semantic-{user_id}"),
                "role": "semantic",
                "metadata": metadata,
            }],
        });

        self.post_and_swallow("/api/v2/memories/semantic/add", &payload, "semantic write")
            .await
    }

    /// Searches the scope. No thread-level filter exists at the protocol
    /// level; callers partition episodic hits client-side. Any failure
    /// yields empty results.
    pub async fn search(
        &self,
        scope: &MemoryScope,
        query: &str,
        limit: u32,
        include_semantic: bool,
        include_episodic: bool,
    ) -> MemorySearchResults {
        let mut types = Vec::new();
        if include_semantic {
            types.push("semantic");
        }
        if include_episodic {
            types.push("episodic");
        }
        if types.is_empty() {
            return MemorySearchResults::default();
        }

        let payload = json!({
            "org_id": scope.namespace_id,
            "project_id": scope.partition_id,
            "query": query,
            "top_k": limit,
            "types": types,
            "filter": "",
            "group_by": null,
            "rerank": true,
            "include_metadata": true,
        });

        let response = self
            .search_client
            .post(format!("{}/api/v2/memories/search", self.base_url))
            .json(&payload)
            .send()
            .await;

        let body: Value = match response {
            Ok(resp) if resp.status().is_success() => match resp.json().await {
                Ok(v) => v,
                Err(e) => {
                    warn!(error = %e, "memory search returned unparseable body");
                    return MemorySearchResults::default();
                }
            },
            Ok(resp) => {
                warn!(status = %resp.status(), "memory search rejected");
                return MemorySearchResults::default();
            }
            Err(e) => {
                warn!(error = %e, "memory search failed");
                return MemorySearchResults::default();
            }
        };

        let results = parse_search_response(&body);
        debug!(
            episodic = results.episodic.len(),
            semantic = results.semantic.len(),
            "memory search complete"
        );
        results
    }

    /// Deletes every memory in the scope. Best effort.
    pub async fn delete_scope(&self, scope: &MemoryScope) -> bool {
        let payload = json!({
            "org_id": scope.namespace_id,
            "project_id": scope.partition_id,
        });
        match self
            .client
            .delete(format!("{}/api/v2/projects", self.base_url))
            .json(&payload)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                warn!(status = %resp.status(), "memory scope deletion rejected");
                false
            }
            Err(e) => {
                warn!(error = %e, "memory scope deletion failed");
                false
            }
        }
    }

    /// Number of episodes stored in the scope; 0 on any failure.
    pub async fn episode_count(&self, scope: &MemoryScope) -> u64 {
        let payload = json!({
            "org_id": scope.namespace_id,
            "project_id": scope.partition_id,
        });
        let response = self
            .client
            .post(format!("{}/api/v2/projects/get", self.base_url))
            .json(&payload)
            .send()
            .await;
        match response {
            Ok(resp) if resp.status().is_success() => resp
                .json::<Value>()
                .await
                .ok()
                .and_then(|v| v.get("content")?.get("episode_count")?.as_u64())
                .unwrap_or(0),
            Ok(_) | Err(_) => 0,
        }
    }

    async fn post_and_swallow(&self, path: &str, payload: &Value, what: &str) -> bool {
        match self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(payload)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                warn!(status = %resp.status(), "memory {what} rejected");
                false
            }
            Err(e) => {
                warn!(error = %e, "memory {what} failed");
                false
            }
        }
    }
}

/// Pulls hits out of the service's nested response shape. Episodic hits
/// live under `content.episodic_memory.{long_term_memory,short_term_memory}
/// .episodes`; semantic hits under `content.semantic_memory[]` keyed by
/// `value`. Malformed entries are skipped, never fatal.
fn parse_search_response(body: &Value) -> MemorySearchResults {
    let mut results = MemorySearchResults::default();
    let Some(content) = body.get("content") else {
        return results;
    };

    if let Some(episodic) = content.get("episodic_memory") {
        for tier in ["long_term_memory", "short_term_memory"] {
            let episodes = episodic
                .get(tier)
                .and_then(|t| t.get("episodes"))
                .and_then(Value::as_array);
            let Some(episodes) = episodes else { continue };
            for episode in episodes {
                let Some(text) = episode.get("content").and_then(Value::as_str) else {
                    continue;
                };
                results.episodic.push(EpisodicHit {
                    content: text.to_string(),
                    metadata: episode
                        .get("metadata")
                        .and_then(Value::as_object)
                        .cloned()
                        .unwrap_or_default(),
                    score: episode.get("score").and_then(Value::as_f64).unwrap_or(1.0),
                    created_at: episode
                        .get("created_at")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                });
            }
        }
    }

    if let Some(semantic) = content.get("semantic_memory").and_then(Value::as_array) {
        for item in semantic {
            let Some(value) = item.get("value").and_then(Value::as_str) else {
                continue;
            };
            results.semantic.push(SemanticHit {
                value: value.to_string(),
                category: item
                    .get("category")
                    .and_then(Value::as_str)
                    .unwrap_or("profile")
                    .to_string(),
            });
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::resolve_scope;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> MemoryClient {
        MemoryClient::new(server.uri(), 5, 10).unwrap()
    }

    #[tokio::test]
    async fn ensure_scope_short_circuits_when_present() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/projects/get"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": {}})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        assert!(client.ensure_scope(&resolve_scope("1", None)).await);
    }

    #[tokio::test]
    async fn ensure_scope_creates_on_miss() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/projects/get"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v2/projects"))
            .and(body_partial_json(json!({
                "org_id": "memoir",
                "project_id": "proj-9",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        assert!(client.ensure_scope(&resolve_scope("1", Some("9"))).await);
    }

    #[tokio::test]
    async fn ensure_scope_fails_open_when_unreachable() {
        let client = MemoryClient::new("http://127.0.0.1:1".to_string(), 1, 1).unwrap();
        assert!(!client.ensure_scope(&resolve_scope("1", None)).await);
    }

    #[tokio::test]
    async fn write_episodic_sends_stringified_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/memories"))
            .and(body_partial_json(json!({
                "org_id": "user-7",
                "project_id": "personal",
                "messages": [{
                    "producer": "user",
                    "produced_for": "thread-t1",
                    "role": "user",
                    "metadata": {
                        "thread_id": "t1",
                        "user_id": "7",
                        "role": "user",
                        "source": "memoir",
                    },
                }],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let ok = client
            .write_episodic(
                &resolve_scope("7", None),
                "t1",
                "7",
                "user",
                "hello there",
                &BTreeMap::new(),
            )
            .await;
        assert!(ok);
    }

    #[tokio::test]
    async fn write_semantic_uses_system_producer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/memories/semantic/add"))
            .and(body_partial_json(json!({
                "messages": [{
                    "producer": "system",
                    "role": "semantic",
                    "metadata": {"type": "semantic", "source": "memoir"},
                }],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let mut meta = BTreeMap::new();
        meta.insert("category".to_string(), "user_fact".to_string());
        let ok = client
            .write_semantic(&resolve_scope("7", None), "7", "User lives in Austin", &meta)
            .await;
        assert!(ok);
    }

    #[tokio::test]
    async fn write_failure_returns_false_not_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/memories"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let ok = client
            .write_episodic(&resolve_scope("7", None), "t1", "7", "user", "x", &BTreeMap::new())
            .await;
        assert!(!ok);
    }

    #[tokio::test]
    async fn search_parses_nested_episodic_and_semantic() {
        let server = MockServer::start().await;
        let body = json!({
            "content": {
                "episodic_memory": {
                    "long_term_memory": {
                        "episodes": [
                            {"content": "old turn", "metadata": {"thread_id": "t2"}, "score": 0.8},
                            {"no_content": true},
                        ]
                    },
                    "short_term_memory": {
                        "episodes": [
                            {"content": "recent turn", "metadata": {"thread_id": "t1"}}
                        ]
                    }
                },
                "semantic_memory": [
                    {"value": "User lives in Austin", "category": "user_fact"},
                    {"missing_value": true},
                ]
            }
        });
        Mock::given(method("POST"))
            .and(path("/api/v2/memories/search"))
            .and(body_partial_json(json!({
                "org_id": "user-7",
                "project_id": "personal",
                "query": "austin",
                "top_k": 20,
                "rerank": true,
                "include_metadata": true,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let results = client
            .search(&resolve_scope("7", None), "austin", 20, true, true)
            .await;

        assert_eq!(results.episodic.len(), 2);
        assert_eq!(results.episodic[0].content, "old turn");
        assert_eq!(results.episodic[1].content, "recent turn");
        assert_eq!(results.semantic.len(), 1);
        assert_eq!(results.semantic[0].value, "User lives in Austin");
        assert_eq!(results.semantic[0].category, "user_fact");
    }

    #[tokio::test]
    async fn search_returns_empty_on_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/memories/search"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let results = client
            .search(&resolve_scope("7", None), "anything", 20, true, true)
            .await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn search_with_no_types_skips_the_request() {
        let server = MockServer::start().await;
        // No mock mounted: a request would 404 and log, but none is sent.
        let client = test_client(&server);
        let results = client
            .search(&resolve_scope("7", None), "anything", 20, false, false)
            .await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn episode_count_reads_content_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/projects/get"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"content": {"episode_count": 12}})),
            )
            .mount(&server)
            .await;

        let client = test_client(&server);
        assert_eq!(client.episode_count(&resolve_scope("7", None)).await, 12);
    }

    #[tokio::test]
    async fn delete_scope_hits_projects_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v2/projects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        assert!(client.delete_scope(&resolve_scope("7", Some("3"))).await);
    }
}
