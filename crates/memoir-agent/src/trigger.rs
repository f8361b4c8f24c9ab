// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic web-search trigger.
//!
//! A message that reads like a request for fresh or external information
//! fires a search before the completion call. Keyword families: explicit
//! search verbs, recency markers, volatile topics, and question shapes
//! anchored to the present.

use std::sync::LazyLock;

use regex::RegexSet;

static TRIGGERS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)\b(search|find|look up|google)\b",
        r"(?i)\b(latest|recent|current|today|now|this week|this month|2024|2025|2026)\b",
        r"(?i)\b(price|stock|weather|news|score|result)\b",
        r"(?i)\b(what is|who is|when did|where is)\b.*\b(now|today|currently|latest)\b",
    ])
    .unwrap()
});

/// Whether the message warrants a web search.
pub fn should_search(message: &str) -> bool {
    TRIGGERS.is_match(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volatile_topics_trigger() {
        assert!(should_search("What's the weather in Austin?"));
        assert!(should_search("how did the game score end up"));
        assert!(should_search("TSLA stock check please"));
    }

    #[test]
    fn recency_markers_trigger() {
        assert!(should_search("any news from this week?"));
        assert!(should_search("What happened in 2026 so far?"));
        assert!(should_search("tell me the latest on the merger"));
    }

    #[test]
    fn explicit_search_verbs_trigger() {
        assert!(should_search("search for good ramen nearby"));
        assert!(should_search("can you look up that paper"));
        assert!(should_search("Google the Rust release schedule"));
    }

    #[test]
    fn anchored_questions_trigger() {
        assert!(should_search("who is the prime minister now"));
        assert!(should_search("what is the exchange rate currently"));
    }

    #[test]
    fn ordinary_chat_does_not_trigger() {
        assert!(!should_search("Tell me a joke about penguins"));
        assert!(!should_search("Can you refactor this function for me?"));
        assert!(!should_search("I liked your previous answer, thanks"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert!(should_search("LATEST developments please"));
        assert!(should_search("WeAtHeR?"));
    }
}
