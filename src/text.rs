// src/text.rs
//! Small text helpers shared by the extractors: capitalisation, truncation,
//! keyword matching at word starts, and the anonymised dev logger.

use sha2::{Digest, Sha256};
use tracing::info;

/// Upper-case the first character of every whitespace-separated word.
///
/// The rest of each word is left untouched, so acronyms ("AI", "CS") survive
/// and applying it twice is the same as applying it once.
pub fn capitalize_words(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut at_word_start = true;
    for ch in input.chars() {
        if ch.is_whitespace() {
            at_word_start = true;
            out.push(ch);
        } else if at_word_start {
            out.extend(ch.to_uppercase());
            at_word_start = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Cut `input` to at most `max` characters, replacing the tail with `...`.
pub fn truncate_with_ellipsis(input: &str, max: usize) -> String {
    if input.chars().count() <= max {
        return input.to_string();
    }
    let keep = max.saturating_sub(3);
    let head: String = input.chars().take(keep).collect();
    format!("{head}...")
}

/// Case-insensitive "keyword occurs at the start of a word" check.
///
/// `art` matches "Art exhibition" and "arts" but not "start"; multi-word
/// keywords ("sign up") work the same way.
pub fn contains_word_prefix(haystack_lower: &str, keyword: &str) -> bool {
    let kw = keyword.trim().to_lowercase();
    if kw.is_empty() {
        return false;
    }
    haystack_lower.match_indices(kw.as_str()).any(|(idx, _)| {
        haystack_lower[..idx]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric())
    })
}

/// Lowercase + collapse whitespace runs to a single space.
pub fn normalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_space = false;
    for ch in input.chars() {
        if ch.is_whitespace() {
            if !last_space {
                out.push(' ');
                last_space = true;
            }
        } else {
            out.extend(ch.to_lowercase());
            last_space = false;
        }
    }
    out.trim().to_string()
}

/// Turn a display name into a URL path segment: "Test Paper" -> "test-paper".
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_dash = true;
    for ch in input.chars() {
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

// Dev logging gate: EXTRACT_DEV_LOG=1 AND dev env (debug or SHUTTLE_ENV in {local,development,dev})
pub fn dev_logging_enabled() -> bool {
    let on = std::env::var("EXTRACT_DEV_LOG").ok().as_deref() == Some("1");
    if !on {
        return false;
    }
    if cfg!(debug_assertions) {
        return true;
    }
    is_dev_env()
}

pub(crate) fn is_dev_env() -> bool {
    matches!(
        std::env::var("SHUTTLE_ENV")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

/// Short stable fingerprint of a text, safe to put in logs.
pub(crate) fn anon_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Minimal, anonymized dev logger for extraction events. Never logs raw text.
pub(crate) fn dev_log_extraction(event: &str, text: &str, kind: &str, defaulted: &[&str]) {
    if !dev_logging_enabled() {
        return;
    }
    let id = anon_hash(text);
    info!(
        target: "extract",
        %id, kind, event,
        chars = text.chars().count(),
        defaulted = ?defaulted
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalize_keeps_acronyms_and_is_idempotent() {
        let once = capitalize_words("AI hackathon 2024 on machine learning");
        assert_eq!(once, "AI Hackathon 2024 On Machine Learning");
        assert_eq!(capitalize_words(&once), once);
    }

    #[test]
    fn capitalize_handles_empty_and_unicode() {
        assert_eq!(capitalize_words(""), "");
        assert_eq!(capitalize_words("éclair  night"), "Éclair  Night");
    }

    #[test]
    fn truncation_counts_chars() {
        let long = "a".repeat(60);
        let t = truncate_with_ellipsis(&long, 50);
        assert_eq!(t.chars().count(), 50);
        assert!(t.ends_with("..."));
        assert_eq!(truncate_with_ellipsis("short", 50), "short");
    }

    #[test]
    fn word_prefix_matching() {
        let hay = "please sign up for the art show before the start";
        assert!(contains_word_prefix(hay, "sign up"));
        assert!(contains_word_prefix(hay, "Art"));
        assert!(!contains_word_prefix("the start", "art"));
        assert!(contains_word_prefix("mathematics notes", "math"));
        assert!(!contains_word_prefix(hay, ""));
    }

    #[test]
    fn slugs() {
        assert_eq!(slugify("Test Paper"), "test-paper");
        assert_eq!(slugify("  Computer   Science "), "computer-science");
    }

    #[test]
    fn anon_hash_is_short_and_stable() {
        assert_eq!(anon_hash("x"), anon_hash("x"));
        assert_eq!(anon_hash("x").len(), 12);
    }
}
