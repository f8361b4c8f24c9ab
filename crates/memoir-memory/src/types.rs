// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Result types returned by memory search, plus the client-side
//! thread partition helper.

use serde_json::Value;

/// One episodic (conversation) memory hit.
#[derive(Debug, Clone)]
pub struct EpisodicHit {
    pub content: String,
    /// Raw metadata as returned by the service. Values are nominally
    /// strings but older records may carry numbers.
    pub metadata: serde_json::Map<String, Value>,
    pub score: f64,
    pub created_at: String,
}

/// One semantic (long-term fact) memory hit.
#[derive(Debug, Clone)]
pub struct SemanticHit {
    pub value: String,
    pub category: String,
}

/// Combined search results. Both lists empty when the service is
/// unreachable or returns garbage.
#[derive(Debug, Clone, Default)]
pub struct MemorySearchResults {
    pub episodic: Vec<EpisodicHit>,
    pub semantic: Vec<SemanticHit>,
}

impl MemorySearchResults {
    pub fn is_empty(&self) -> bool {
        self.episodic.is_empty() && self.semantic.is_empty()
    }
}

/// Splits episodic hits into (current thread, other threads) by the
/// `thread_id` metadata entry, compared as strings. The search protocol
/// has no thread-level filter, so this is best-effort: hits with
/// missing or malformed metadata land in "other".
pub fn partition_by_thread(
    hits: Vec<EpisodicHit>,
    thread_id: &str,
) -> (Vec<EpisodicHit>, Vec<EpisodicHit>) {
    let mut current = Vec::new();
    let mut other = Vec::new();
    for hit in hits {
        let matches = match hit.metadata.get("thread_id") {
            Some(Value::String(s)) => s == thread_id,
            Some(Value::Number(n)) => n.to_string() == thread_id,
            _ => false,
        };
        if matches {
            current.push(hit);
        } else {
            other.push(hit);
        }
    }
    (current, other)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hit(content: &str, metadata: Value) -> EpisodicHit {
        EpisodicHit {
            content: content.to_string(),
            metadata: metadata.as_object().cloned().unwrap_or_default(),
            score: 1.0,
            created_at: String::new(),
        }
    }

    #[test]
    fn partition_splits_on_thread_id() {
        let hits = vec![
            hit("a", json!({"thread_id": "t1"})),
            hit("b", json!({"thread_id": "t2"})),
            hit("c", json!({"thread_id": "t1"})),
        ];
        let (current, other) = partition_by_thread(hits, "t1");
        assert_eq!(current.len(), 2);
        assert_eq!(other.len(), 1);
        assert_eq!(other[0].content, "b");
    }

    #[test]
    fn numeric_thread_id_compares_as_string() {
        let hits = vec![hit("a", json!({"thread_id": 17}))];
        let (current, other) = partition_by_thread(hits, "17");
        assert_eq!(current.len(), 1);
        assert!(other.is_empty());
    }

    #[test]
    fn missing_or_malformed_metadata_goes_to_other() {
        let hits = vec![
            hit("no-meta", json!({})),
            hit("wrong-type", json!({"thread_id": ["t1"]})),
        ];
        let (current, other) = partition_by_thread(hits, "t1");
        assert!(current.is_empty());
        assert_eq!(other.len(), 2);
    }

    #[test]
    fn partition_preserves_order() {
        let hits = vec![
            hit("1", json!({"thread_id": "t1"})),
            hit("2", json!({"thread_id": "t9"})),
            hit("3", json!({"thread_id": "t1"})),
            hit("4", json!({"thread_id": "t8"})),
        ];
        let (current, other) = partition_by_thread(hits, "t1");
        let current: Vec<_> = current.iter().map(|h| h.content.as_str()).collect();
        let other: Vec<_> = other.iter().map(|h| h.content.as_str()).collect();
        assert_eq!(current, vec!["1", "3"]);
        assert_eq!(other, vec!["2", "4"]);
    }
}
