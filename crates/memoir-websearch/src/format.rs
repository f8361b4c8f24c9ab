// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns search responses into a prompt section, optionally filtered
//! to the user's location.

use crate::client::WebSearchResponse;

/// Excerpts are truncated to roughly this many bytes, on a char boundary.
const EXCERPT_LIMIT: usize = 300;

/// Formats a response for inclusion in the system prompt.
///
/// With a `location`, results are kept when their title or excerpt
/// mentions the location, its whitespace-stripped variant, or its first
/// word (case-insensitive). A location filter that removes every result
/// produces an explicit marker line instead of silence, so the model
/// knows the search happened.
pub fn format_for_prompt(response: &WebSearchResponse, location: Option<&str>) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(answer) = &response.answer
        && !answer.is_empty()
    {
        parts.push(format!("ANSWER:\n{answer}\n"));
    }

    let kept: Vec<_> = match location {
        Some(location) if !location.trim().is_empty() => {
            let needles = location_needles(location);
            response
                .results
                .iter()
                .filter(|r| {
                    let haystack = format!("{} {}", r.title, r.excerpt).to_lowercase();
                    needles.iter().any(|n| haystack.contains(n))
                })
                .collect()
        }
        _ => response.results.iter().collect(),
    };

    if kept.is_empty() {
        if let Some(location) = location
            && !response.results.is_empty()
        {
            parts.push(format!("No location-specific results for {location}."));
        }
    } else {
        let mut section = String::from("WEB SEARCH RESULTS:\n");
        for (idx, result) in kept.iter().enumerate() {
            let excerpt = truncate_on_char_boundary(&result.excerpt, EXCERPT_LIMIT);
            section.push_str(&format!(
                "\n{}. {}\n   URL: {}\n   {}\n",
                idx + 1,
                result.title,
                result.url,
                excerpt,
            ));
        }
        parts.push(section);
    }

    parts.join("\n")
}

fn location_needles(location: &str) -> Vec<String> {
    let lowered = location.to_lowercase();
    let mut needles = vec![lowered.clone()];
    let stripped: String = lowered.chars().filter(|c| !c.is_whitespace()).collect();
    if stripped != lowered {
        needles.push(stripped);
    }
    if let Some(first) = lowered.split_whitespace().next()
        && first != lowered
    {
        needles.push(first.trim_end_matches(',').to_string());
    }
    needles
}

fn truncate_on_char_boundary(s: &str, limit: usize) -> &str {
    if s.len() <= limit {
        return s;
    }
    let mut end = limit;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::WebSearchResult;

    fn result(title: &str, excerpt: &str) -> WebSearchResult {
        WebSearchResult {
            title: title.to_string(),
            url: format!("https://example.com/{}", title.to_lowercase()),
            excerpt: excerpt.to_string(),
        }
    }

    #[test]
    fn empty_response_formats_to_nothing() {
        assert_eq!(format_for_prompt(&WebSearchResponse::empty(), None), "");
    }

    #[test]
    fn answer_comes_before_results() {
        let response = WebSearchResponse {
            answer: Some("It is sunny.".to_string()),
            results: vec![result("Weather", "Sunny in Austin today")],
        };
        let formatted = format_for_prompt(&response, None);
        let answer_pos = formatted.find("ANSWER:").unwrap();
        let results_pos = formatted.find("WEB SEARCH RESULTS:").unwrap();
        assert!(answer_pos < results_pos);
        assert!(formatted.contains("1. Weather"));
        assert!(formatted.contains("URL: https://example.com/weather"));
    }

    #[test]
    fn excerpt_is_truncated_on_char_boundary() {
        let long = "é".repeat(400); // 2 bytes per char, 800 bytes total
        let response = WebSearchResponse {
            answer: None,
            results: vec![result("Long", &long)],
        };
        let formatted = format_for_prompt(&response, None);
        // 300 bytes of 2-byte chars is exactly 150 chars.
        assert!(formatted.contains(&"é".repeat(150)));
        assert!(!formatted.contains(&"é".repeat(151)));
    }

    #[test]
    fn location_filter_keeps_matching_results() {
        let response = WebSearchResponse {
            answer: None,
            results: vec![
                result("Events in Austin this weekend", "Live music downtown"),
                result("Houston happenings", "Rodeo season"),
            ],
        };
        let formatted = format_for_prompt(&response, Some("Austin, TX"));
        assert!(formatted.contains("Austin"));
        assert!(!formatted.contains("Houston"));
    }

    #[test]
    fn first_word_variant_matches() {
        // "Austin, TX" whole string doesn't appear, but its first word does.
        let response = WebSearchResponse {
            answer: None,
            results: vec![result("City guide", "Top restaurants in austin right now")],
        };
        let formatted = format_for_prompt(&response, Some("Austin, TX"));
        assert!(formatted.contains("City guide"));
    }

    #[test]
    fn whitespace_stripped_variant_matches() {
        let response = WebSearchResponse {
            answer: None,
            results: vec![result("Tags", "Trending: #newyorkcity events")],
        };
        let formatted = format_for_prompt(&response, Some("New York City"));
        assert!(formatted.contains("Tags"));
    }

    #[test]
    fn filter_removing_everything_emits_marker() {
        let response = WebSearchResponse {
            answer: None,
            results: vec![result("Houston happenings", "Rodeo season")],
        };
        let formatted = format_for_prompt(&response, Some("Austin, TX"));
        assert!(formatted.contains("No location-specific results for Austin, TX."));
        assert!(!formatted.contains("WEB SEARCH RESULTS"));
    }

    #[test]
    fn no_marker_when_results_were_empty_to_begin_with() {
        let formatted = format_for_prompt(&WebSearchResponse::empty(), Some("Austin, TX"));
        assert_eq!(formatted, "");
    }
}
