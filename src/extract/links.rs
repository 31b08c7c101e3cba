// src/extract/links.rs
//! URLs, registration links and the contact-ish fields that travel with them.
//!
//! Every URL candidate is normalised to `https://…` and must parse with a host.
//! Its role is decided by a label directly in front of it (`Website:`,
//! `Register at`) or else by registration keywords in a ±50-character window
//! that never crosses into another sentence or another URL.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use super::labels::{extract_application_method, extract_contact, extract_organizer};
use super::patterns::{sentence_end, sentence_start};
use crate::text::contains_word_prefix;

/// Characters of context inspected on each side of a URL.
pub const CONTEXT_CHARS: usize = 50;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Links {
    pub website_url: Option<String>,
    pub registration_link: Option<String>,
    pub organizer: Option<String>,
    pub contact_info: Option<String>,
    pub application_method: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRole {
    Website,
    Registration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlHit {
    /// Normalised, validated URL.
    pub url: String,
    /// Byte span of the raw candidate in the input.
    pub span: Range<usize>,
}

static SCHEME_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bhttps?://[^\s<>"'(){}\[\]]+"#).expect("scheme url regex")
});

static WWW_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bwww\.[^\s<>"'(){}\[\]]+"#).expect("www url regex"));

/// Bare domains are only trusted right after a link label.
static LABELLED_DOMAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\b(?:website|url|link|visit|web|site|registration|register\s+at|sign\s*up\s+at)(?:[ \t]*:[ \t]*|[ \t]+)(?:us[ \t]+at[ \t]+|at[ \t]+)?([a-z0-9][a-z0-9-]*(?:\.[a-z0-9-]+)+(?:/[^\s<>"']*)?)"#,
    )
    .expect("labelled domain regex")
});

static WEBSITE_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:website|web\s*site|homepage|home\s+page)\s*:?\s*$").expect("website prefix regex")
});

static REGISTRATION_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:registration(?:\s+(?:link|form|page))?|register\s+(?:at|here|via|on)|sign\s*up\s+(?:at|here|via|on))\s*:?\s*$")
        .expect("registration prefix regex")
});

const TRAILING: &[char] = &['.', ',', ';', ':', '!', '?', '*', ')', ']', '\'', '"'];

pub fn extract_links(text: &str, registration_keywords: &[String]) -> Links {
    let hits = url_candidates(text);
    let mut links = Links {
        organizer: extract_organizer(text),
        contact_info: extract_contact(text),
        application_method: extract_application_method(text),
        ..Links::default()
    };

    for (i, hit) in hits.iter().enumerate() {
        let prev_end = i.checked_sub(1).map_or(0, |p| hits[p].span.end);
        let next_start = hits.get(i + 1).map_or(text.len(), |n| n.span.start);
        let slot = match role_of(text, hit, prev_end, next_start, registration_keywords) {
            LinkRole::Registration => &mut links.registration_link,
            LinkRole::Website => &mut links.website_url,
        };
        if slot.is_none() {
            *slot = Some(hit.url.clone());
        }
    }
    links
}

/// First valid URL anywhere in the text, regardless of role.
pub fn first_url(text: &str) -> Option<String> {
    url_candidates(text).into_iter().next().map(|h| h.url)
}

/// All valid URL candidates in order of appearance, without overlaps.
pub fn url_candidates(text: &str) -> Vec<UrlHit> {
    let raw = SCHEME_URL
        .find_iter(text)
        .map(|m| m.range())
        .chain(WWW_URL.find_iter(text).map(|m| m.range()))
        .chain(
            LABELLED_DOMAIN
                .captures_iter(text)
                .filter_map(|c| c.get(1).map(|m| m.range())),
        );

    let mut hits: Vec<UrlHit> = Vec::new();
    for span in raw {
        let candidate = text[span.clone()].trim_end_matches(TRAILING);
        let span = span.start..span.start + candidate.len();
        if hits.iter().any(|h| h.span.start < span.end && span.start < h.span.end) {
            continue;
        }
        if let Some(url) = normalize_url(candidate) {
            hits.push(UrlHit { url, span });
        }
    }
    hits.sort_by_key(|h| h.span.start);
    hits
}

/// Prefix `https://` where missing and keep the value only if it parses with a
/// plausible host. Trailing punctuation is dropped.
pub fn normalize_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches(TRAILING);
    if trimmed.is_empty() {
        return None;
    }
    let has_scheme = trimmed.to_ascii_lowercase().starts_with("http://")
        || trimmed.to_ascii_lowercase().starts_with("https://");
    let candidate = if has_scheme {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let parsed = Url::parse(&candidate).ok()?;
    let host = parsed.host_str()?;
    if !has_scheme && !looks_like_domain(host) {
        return None;
    }
    Some(candidate)
}

/// `example.com` yes, `3.5` or `localhost` no.
fn looks_like_domain(host: &str) -> bool {
    match host.rsplit_once('.') {
        Some((_, tld)) => tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()),
        None => false,
    }
}

fn role_of(
    text: &str,
    hit: &UrlHit,
    prev_end: usize,
    next_start: usize,
    keywords: &[String],
) -> LinkRole {
    let before = &text[prev_end..hit.span.start];
    if REGISTRATION_PREFIX.is_match(before) {
        return LinkRole::Registration;
    }
    if WEBSITE_PREFIX.is_match(before) {
        return LinkRole::Website;
    }

    let start = back_chars(text, hit.span.start, CONTEXT_CHARS)
        .max(sentence_start(text, hit.span.start))
        .max(prev_end);
    let end = forward_chars(text, hit.span.end, CONTEXT_CHARS)
        .min(sentence_end(text, hit.span.end))
        .min(next_start);

    let window = format!(
        "{} {}",
        &text[start..hit.span.start],
        &text[hit.span.end..end.max(hit.span.end)]
    )
    .to_lowercase();

    if keywords.iter().any(|kw| contains_word_prefix(&window, kw)) {
        LinkRole::Registration
    } else {
        LinkRole::Website
    }
}

fn back_chars(text: &str, from: usize, n: usize) -> usize {
    text[..from]
        .char_indices()
        .rev()
        .take(n)
        .last()
        .map_or(from, |(i, _)| i)
}

fn forward_chars(text: &str, from: usize, n: usize) -> usize {
    text[from..]
        .char_indices()
        .nth(n)
        .map_or(text.len(), |(i, _)| from + i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords() -> Vec<String> {
        ["register", "sign up", "join", "enroll", "apply"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn registration_and_website_are_told_apart() {
        let l = extract_links(
            "Sign up at https://reg.example.com. Learn more at https://info.example.com.",
            &keywords(),
        );
        assert_eq!(l.registration_link.as_deref(), Some("https://reg.example.com"));
        assert_eq!(l.website_url.as_deref(), Some("https://info.example.com"));
    }

    #[test]
    fn bare_domains_need_a_label() {
        let l = extract_links(
            "Details below. Visit ml-workshop.example.com for info.",
            &keywords(),
        );
        assert_eq!(l.website_url.as_deref(), Some("https://ml-workshop.example.com"));

        let l = extract_links("Workshop, contact prof@x.edu, register at reg.example.com", &keywords());
        assert_eq!(l.registration_link.as_deref(), Some("https://reg.example.com"));
        assert_eq!(l.website_url, None);
        assert_eq!(l.contact_info.as_deref(), Some("prof@x.edu"));

        // no label, no URL
        assert_eq!(url_candidates("see notes.pdf and example.com"), vec![]);
    }

    #[test]
    fn www_and_trailing_punctuation() {
        let l = extract_links("More at www.campus.edu/fest!", &keywords());
        assert_eq!(l.website_url.as_deref(), Some("https://www.campus.edu/fest"));
    }

    #[test]
    fn explicit_labels_decide_the_role() {
        let l = extract_links(
            "Join us! Website: https://club.example.org\nRegistration: forms.example.org/x",
            &keywords(),
        );
        assert_eq!(l.website_url.as_deref(), Some("https://club.example.org"));
        assert_eq!(l.registration_link.as_deref(), Some("https://forms.example.org/x"));
    }

    #[test]
    fn first_url_of_each_role_wins() {
        let l = extract_links(
            "Info: https://a.example.com\nMore: https://b.example.com",
            &keywords(),
        );
        assert_eq!(l.website_url.as_deref(), Some("https://a.example.com"));
        assert_eq!(l.registration_link, None);
    }

    #[test]
    fn invalid_urls_are_dropped() {
        assert_eq!(normalize_url("https://"), None);
        assert_eq!(normalize_url("visit 3.5"), None);
        assert_eq!(normalize_url("3.5"), None);
        assert_eq!(normalize_url("example.com."), Some("https://example.com".into()));
        assert_eq!(normalize_url("HTTP://Example.com"), Some("HTTP://Example.com".into()));
    }

    #[test]
    fn windows_respect_multibyte_text() {
        let l = extract_links("Café ☕ opening — https://cafe.example.com — enroll now", &keywords());
        assert_eq!(l.registration_link.as_deref(), Some("https://cafe.example.com"));
    }
}
