// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic extraction of durable user facts from a completed turn.
//!
//! Pattern-based, not model-based: cheap enough to run on every turn,
//! and wrong often enough that downstream consumers treat the output as
//! hints, not ground truth.

use std::sync::LazyLock;

use regex::Regex;

/// Extracts long-term facts worth persisting from one exchange.
pub trait FactExtractor: Send + Sync {
    fn extract(&self, user_text: &str, reply_text: &str) -> Vec<String>;
}

enum Source {
    User,
    Reply,
}

struct Template {
    pattern: Regex,
    prefix: &'static str,
    source: Source,
}

/// Capture runs to the next clause or sentence boundary; a trailing
/// "and I ..."/"but I ..." coordinate clause stays out of the value.
const VALUE: &str = r"([^.,!?;\n]+?)(?:[.,!?;\n]|\s+(?:and|but)\s+i\b|$)";
/// Bounded by punctuation only, for templates with text after the capture.
const VALUE_MID: &str = r"([^.,!?;\n]+?)";

static TEMPLATES: LazyLock<Vec<Template>> = LazyLock::new(|| {
    let user = |raw: &str, prefix: &'static str| Template {
        pattern: Regex::new(&format!("(?i){raw}")).unwrap(),
        prefix,
        source: Source::User,
    };
    let reply = |raw: &str, prefix: &'static str| Template {
        pattern: Regex::new(&format!("(?i){raw}")).unwrap(),
        prefix,
        source: Source::Reply,
    };
    vec![
        user(&format!(r"\bi live in {VALUE}"), "User lives in "),
        user(&format!(r"\bi'?m from {VALUE}"), "User is from "),
        user(&format!(r"\bi moved to {VALUE}"), "User lives in "),
        user(&format!(r"\bmy name is {VALUE}"), "User's name is "),
        user(&format!(r"\bcall me {VALUE}"), "User's name is "),
        user(&format!(r"\bi work as {VALUE}"), "User works as "),
        user(
            &format!(r"\bi'?m {VALUE_MID} by profession"),
            "User works as ",
        ),
        user(&format!(r"\bmy job is {VALUE}"), "User works as "),
        user(&format!(r"\bi (?:like|love) {VALUE}"), "User likes "),
        user(
            &format!(r"\bi (?:hate|dislike) {VALUE}"),
            "User dislikes ",
        ),
        reply(&format!(r"\byou live in {VALUE}"), "User lives in "),
        reply(&format!(r"\byour name is {VALUE}"), "User's name is "),
    ]
});

/// Regex-template extractor over the user message and, for confirmation
/// phrasings, the assistant reply.
#[derive(Debug, Default, Clone)]
pub struct PatternFactExtractor;

impl FactExtractor for PatternFactExtractor {
    fn extract(&self, user_text: &str, reply_text: &str) -> Vec<String> {
        let mut facts = Vec::new();
        for template in TEMPLATES.iter() {
            let haystack = match template.source {
                Source::User => user_text,
                Source::Reply => reply_text,
            };
            for caps in template.pattern.captures_iter(haystack) {
                let Some(value) = caps.get(1) else { continue };
                let value = value.as_str().trim();
                if value.len() < 3 || value.len() > 150 {
                    continue;
                }
                let fact = format!("{}{}", template.prefix, value);
                if !facts.contains(&fact) {
                    facts.push(fact);
                }
            }
        }
        facts
    }
}
