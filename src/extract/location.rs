// src/extract/location.rs
//! Location: explicit labels, then `at <place> on|at|from…`, then a
//! capitalised place phrase after `at`/`in (the)`.

use once_cell::sync::Lazy;
use regex::Regex;

use super::patterns::is_month_or_weekday;

static LABELLED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:location|venue|place|where)[ \t]*:[ \t]*([^\n.;]+)").expect("location label regex")
});

/// `at X` where X is followed by another schedule preposition.
static AT_BOUNDED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bat\s+([^\n.;,]+?)\s+(?:on|at|from|till|until|to)\s").expect("at-bounded regex")
});

/// Capitalised words after `at`/`in`, optionally through "the" and "of".
static CAPITALISED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:[Aa]t|[Ii]n)\s+(?:[Tt]he\s+)?([A-Z][\w'&-]*(?:\s+(?:of\s+)?[A-Z0-9][\w'&-]*)*)")
        .expect("capitalised place regex")
});

static TIME_LIKE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:\d|noon\b|midnight\b|[ap]\.?m\b)").expect("time-like regex")
});

static LEADING_ARTICLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^the\s+").expect("article regex"));

pub fn extract_location(text: &str) -> Option<String> {
    if let Some(v) = LABELLED
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|v| !v.is_empty())
    {
        return Some(v);
    }

    if let Some(v) = AT_BOUNDED
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| LEADING_ARTICLE.replace(m.as_str().trim(), "").into_owned())
        .find(|v| is_place(v))
    {
        return Some(v);
    }

    CAPITALISED
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .find(|v| is_place(v))
}

fn is_place(candidate: &str) -> bool {
    let first = candidate.split_whitespace().next().unwrap_or_default();
    !candidate.is_empty()
        && !TIME_LIKE.is_match(candidate)
        && !is_month_or_weekday(first)
        && !candidate.contains("://")
        && !candidate.contains('@')
}
