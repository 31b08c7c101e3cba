// src/extract/patterns.rs
//! Regex fragments and helpers shared between extractors.

use once_cell::sync::Lazy;
use regex::Regex;

/// Month names, full forms first so alternation prefers them. Use under `(?i)`.
pub const MONTHS: &str = "(?:january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec)";

pub const WEEKDAYS: &str = "(?:monday|tuesday|wednesday|thursday|friday|saturday|sunday)";

/// Lines that carry some other field (`Date: …`, `Venue: …`) and so never
/// make a title.
static FIELD_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:subject|type|category|event\s+type|url|link|website|web|date|when|time|location|venue|place|contact(?:\s+\w+)?|e-?mail|phone|organi[sz]er|organi[sz]ed\s+by|hosted\s+by|description|about|details|registration|register\s+at|how\s+to\s+apply|apply\s+by|additional\s+\w+|title|event|name|topic)[ \t]*:",
    )
    .expect("field-line regex")
});

pub fn is_field_line(line: &str) -> bool {
    FIELD_LINE.is_match(line.trim())
}

/// 1-based month number for a full or abbreviated English month name.
pub fn month_number(name: &str) -> Option<u32> {
    let n = name.trim().trim_end_matches('.').to_lowercase();
    let idx = match n.as_str() {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sept" | "sep" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => return None,
    };
    Some(idx)
}

pub fn is_month_or_weekday(word: &str) -> bool {
    let w = word.trim().to_lowercase();
    month_number(&w).is_some()
        || matches!(
            w.as_str(),
            "monday" | "tuesday" | "wednesday" | "thursday" | "friday" | "saturday" | "sunday"
        )
}

/// Byte offset where the sentence containing `from` ends. Dots inside tokens
/// ("example.com", "3.5") and after common titles ("Prof.", "Dr.") do not count.
pub fn sentence_end(text: &str, from: usize) -> usize {
    let bytes = text.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\n' {
            return i;
        }
        if matches!(b, b'.' | b'!' | b'?') {
            let next_is_space = bytes
                .get(i + 1)
                .map_or(true, |n| n.is_ascii_whitespace());
            if next_is_space && !(b == b'.' && ends_with_abbreviation(&text[..i])) {
                return i;
            }
        }
        i += 1;
    }
    text.len()
}

/// Byte offset where the sentence containing `upto` starts.
pub fn sentence_start(text: &str, upto: usize) -> usize {
    let bytes = text.as_bytes();
    let mut i = upto.min(bytes.len());
    while i > 0 {
        let b = bytes[i - 1];
        if b == b'\n' {
            return i;
        }
        if matches!(b, b'.' | b'!' | b'?')
            && bytes.get(i).map_or(true, |n| n.is_ascii_whitespace())
            && !(b == b'.' && ends_with_abbreviation(&text[..i - 1]))
        {
            return i;
        }
        i -= 1;
    }
    0
}

fn ends_with_abbreviation(before_dot: &str) -> bool {
    let word: String = before_dot
        .chars()
        .rev()
        .take_while(|c| c.is_alphabetic())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    matches!(
        word.to_lowercase().as_str(),
        "prof" | "dr" | "mr" | "mrs" | "ms" | "st" | "no" | "dept" | "asst" | "assoc" | "jr" | "sr"
    ) || (word.chars().count() == 1 && word.chars().all(|c| c.is_uppercase()))
}

/// Clip a captured label value to its own clause: stop at a line break,
/// a sentence end (titles like "Prof." excepted), or `;`.
pub fn clip_clause(value: &str) -> String {
    let end = sentence_end(value, 0);
    let head = &value[..end];
    let head = head.split(';').next().unwrap_or(head);
    head.trim()
        .trim_end_matches([',', ':', '-'])
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn months() {
        assert_eq!(month_number("March"), Some(3));
        assert_eq!(month_number("sept."), Some(9));
        assert_eq!(month_number("Marc"), None);
        assert!(is_month_or_weekday("Friday"));
        assert!(!is_month_or_weekday("Auditorium"));
    }

    #[test]
    fn sentences_skip_abbreviations_and_domains() {
        let s = "Contact Prof. Smith at x.example.com. Next sentence.";
        let end = sentence_end(s, 0);
        assert_eq!(&s[..end], "Contact Prof. Smith at x.example.com");
        assert_eq!(sentence_start(s, s.len() - 3), end + 1);
    }

    #[test]
    fn clip_clause_stops_at_sentence_or_semicolon() {
        assert_eq!(clip_clause("Dr. Rao; room 4"), "Dr. Rao");
        assert_eq!(clip_clause("the CS Club. Free pizza!"), "the CS Club");
        assert_eq!(clip_clause("prof@x.edu, "), "prof@x.edu");
    }

    #[test]
    fn field_lines() {
        assert!(is_field_line("Venue: Hall B"));
        assert!(is_field_line("  Subject: Physics"));
        assert!(!is_field_line("Venue change announced"));
    }
}
