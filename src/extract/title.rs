// src/extract/title.rs
//! Title extraction: skip greetings, then try labelled titles, lead-ins,
//! domain-noun clauses and year phrases line by line.

use once_cell::sync::Lazy;
use regex::Regex;

use super::patterns::{is_field_line, MONTHS, WEEKDAYS};
use crate::record::FieldOrigin;
use crate::text::{capitalize_words, truncate_with_ellipsis};

/// Fallback titles are cut to this many characters (ellipsis included).
pub const MAX_FALLBACK_TITLE_CHARS: usize = 50;

/// Which explicit `label:` prefixes count as a title for a record kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleRules {
    /// `title:`, `event:`, `name:`, `topic:`, `subject:`
    Event,
    /// Resources keep `subject:` for the subject field.
    Resource,
}

impl TitleRules {
    fn label_regex(self) -> &'static Regex {
        static EVENT: Lazy<Regex> = Lazy::new(|| title_label_regex("title|event|name|topic|subject"));
        static RESOURCE: Lazy<Regex> = Lazy::new(|| title_label_regex("title|name|topic"));
        match self {
            TitleRules::Event => &EVENT,
            TitleRules::Resource => &RESOURCE,
        }
    }
}

fn title_label_regex(labels: &str) -> Regex {
    Regex::new(&format!(r"(?i)^(?:event\s+)?(?:{labels})[ \t]*:[ \t]*([^\n;]+)")).expect("title label regex")
}

static GREETINGS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)^dear\s+(?:students?|friends?|colleagues?|all|everyone|sir|madam|team|members?)\b",
        r"(?i)^(?:hi|hello|hey)(?:\s+(?:all|everyone|there|folks|team|guys))?\s*[,.!]?$",
        r"(?i)^(?:hi|hello|hey)\s+(?:all|everyone|there|folks|team|guys)\b",
        r"(?i)^greetings\b",
        r"(?i)^good\s+(?:morning|afternoon|evening)\b",
        r"(?i)^attention\s+(?:students?|all|everyone)\b",
        r"(?i)^to\s+(?:all|whom\s+it\s+may\s+concern)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("greeting regex"))
    .collect()
});

static LEAD_IN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:proudly\s+presents|presents|announcing|announces|introducing)\s*:?\s+([^\n.!?]+)")
        .expect("lead-in regex")
});

const DOMAIN_NOUNS: &str = "event|festival|fest|competition|tournament|conference|workshop|seminar|symposium|hackathon|webinar|lecture|meetup|fair|expo|summit|bootcamp|concert|championship";

static NOUN_LED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)^(?:{DOMAIN_NOUNS})s?\b")).expect("noun-led regex")
});

static NOUN_TAILED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^(.*?\b(?:{DOMAIN_NOUNS})s?\b(?:\s+(?:19|20)\d{{2}}\b)?)"
    ))
    .expect("noun-tailed regex")
});

static YEAR_PHRASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b((?:[A-Za-z][\w&'-]*\s+){1,3}(?:19|20)\d{2})\b").expect("year-phrase regex")
});

/// Trailing clauses that describe when/where rather than what.
static SCHEDULE_TAIL: Lazy<Regex> = Lazy::new(|| {
    let when = format!(r"(?:\d|{MONTHS}|{WEEKDAYS}|tomorrow|today|tonight|noon|midnight)");
    Regex::new(&format!(
        r"(?i)\s+(?:(?:on|from|this|next|by|until|till|starting)\s+{when}\b|at\s+\d|(?:in|at)\s+the\s+|{MONTHS}\.?\s+\d|\d{{1,2}}(?:st|nd|rd|th)?\s+{MONTHS}\b|\d{{1,2}}(?::\d{{2}})?\s*(?:am|pm)\b|\d{{4}}[-/]\d|\d{{1,2}}:\d{{2}})|\s*[,;:(\[]|\s+[-–—]\s+"
    ))
    .expect("schedule-tail regex")
});

static LEAD_PHRASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:join\s+us\s+(?:for|at)|come\s+(?:to|join)|don'?t\s+miss|welcome\s+to|save\s+the\s+date\s*:?\s*(?:for)?)\s+(?:the\s+|our\s+)?")
        .expect("lead-phrase regex")
});

static SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?](?:\s|$)").expect("sentence-end regex"));

static BARE_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,4}[-/]\d{1,2}[-/]\d{1,4}$").expect("bare-date regex"));

pub fn is_greeting(line: &str) -> bool {
    let l = line.trim();
    GREETINGS.iter().any(|re| re.is_match(l))
}

/// Extract a capitalised title, or `None` when the text has no usable line.
pub fn extract_title(text: &str, rules: TitleRules) -> Option<String> {
    extract_title_with_origin(text, rules).map(|(t, _)| t)
}

/// Like [`extract_title`], but says whether a pattern matched (`Extracted`)
/// or the first line was used as-is (`Inferred`).
pub fn extract_title_with_origin(text: &str, rules: TitleRules) -> Option<(String, FieldOrigin)> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !is_greeting(l))
        .collect();

    for line in &lines {
        if let Some(t) = title_from_line(line, rules) {
            return Some((capitalize_words(&t), FieldOrigin::Extracted));
        }
    }

    lines.iter().find(|l| !is_field_line(l)).map(|line| {
        let t = capitalize_words(&truncate_with_ellipsis(line, MAX_FALLBACK_TITLE_CHARS));
        (t, FieldOrigin::Inferred)
    })
}

fn title_from_line(line: &str, rules: TitleRules) -> Option<String> {
    // (a) explicit labels
    if let Some(t) = labelled_title(line, rules) {
        return Some(t);
    }
    if is_field_line(line) {
        return None;
    }

    // (b) announcing / presents
    if let Some(t) = LEAD_IN
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| clean_clause(m.as_str()))
        .filter(|t| plausible(t))
    {
        return Some(t);
    }

    // (c) leading clause built around a domain noun
    let clause = leading_clause(line);
    let clause = LEAD_PHRASE.replace(clause, "");
    if NOUN_LED.is_match(&clause) {
        let t = clean_clause(&clause);
        if plausible(&t) {
            return Some(t);
        }
    }
    if let Some(t) = NOUN_TAILED
        .captures(&clause)
        .and_then(|c| c.get(1))
        .map(|m| clean_clause(m.as_str()))
        .filter(|t| plausible(t))
    {
        return Some(t);
    }

    // (d) bare year phrase ("TechFest 2025")
    YEAR_PHRASE
        .captures_iter(line)
        .filter_map(|c| c.get(1).map(|m| m.as_str().trim().to_string()))
        .find(|t| plausible(t) && !mentions_month(t))
}

fn labelled_title(line: &str, rules: TitleRules) -> Option<String> {
    let m = rules.label_regex().captures(line)?.get(1)?;
    // a label states the title outright, so short values like "Gym" stand
    let value = m.as_str().trim().trim_end_matches(['.', ';']).trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// The first sentence of a line.
fn leading_clause(line: &str) -> &str {
    match SENTENCE_END.find(line) {
        Some(m) => &line[..m.start()],
        None => line,
    }
}

/// Drop trailing schedule/location clauses and stray punctuation.
fn clean_clause(clause: &str) -> String {
    let cut = SCHEDULE_TAIL
        .find(clause)
        .map(|m| &clause[..m.start()])
        .unwrap_or(clause);
    cut.trim()
        .trim_end_matches(|c: char| !c.is_alphanumeric() && c != ')' && c != '"')
        .trim()
        .to_string()
}

fn plausible(t: &str) -> bool {
    t.chars().count() > 3 && !BARE_DATE.is_match(t)
}

fn mentions_month(t: &str) -> bool {
    static MONTH_WORD: Lazy<Regex> =
        Lazy::new(|| Regex::new(&format!(r"(?i)\b{MONTHS}\b")).expect("month regex"));
    MONTH_WORD.is_match(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(text: &str) -> Option<String> {
        extract_title(text, TitleRules::Event)
    }

    #[test]
    fn noun_led_sentence_is_trimmed_of_schedule() {
        let t = ev("Workshop on Machine Learning on March 15th at 3 PM in the Main Auditorium. Contact Prof. Smith.");
        assert_eq!(t.as_deref(), Some("Workshop On Machine Learning"));
    }

    #[test]
    fn month_without_preposition_is_cut() {
        let t = ev("Workshop on ML March 15th at 3pm in the Auditorium, contact prof@x.edu");
        assert_eq!(t.as_deref(), Some("Workshop On ML"));
    }

    #[test]
    fn greeting_lines_are_skipped() {
        let t = ev("Dear students,\nAI Hackathon 2024 registration now open!");
        assert_eq!(t.as_deref(), Some("AI Hackathon 2024"));
    }

    #[test]
    fn explicit_label_wins() {
        let t = ev("Title: spring career fair\nVenue: Hall B");
        assert_eq!(t.as_deref(), Some("Spring Career Fair"));
        let t = ev("Event: robotics showcase; bring friends");
        assert_eq!(t.as_deref(), Some("Robotics Showcase"));
    }

    #[test]
    fn short_labelled_titles_are_kept() {
        let (t, origin) = extract_title_with_origin("Title: Gym\nDate: 2025-02-01", TitleRules::Event).unwrap();
        assert_eq!(t, "Gym");
        assert_eq!(origin, FieldOrigin::Extracted);
        assert_eq!(ev("Event: Art").as_deref(), Some("Art"));
    }

    #[test]
    fn empty_title_label_is_not_a_title() {
        assert_eq!(ev("title: "), None);
        assert_eq!(ev("Title:\nDate: 2025-02-01"), None);
        let t = ev("Topic:\nRobotics showcase for juniors");
        assert_eq!(t.as_deref(), Some("Robotics Showcase For Juniors"));
    }

    #[test]
    fn numeric_date_and_clock_time_are_cut() {
        assert_eq!(ev("Seminar 2025-02-01 10:00").as_deref(), Some("Seminar"));
        assert_eq!(ev("Seminar 10:00 in Room 4").as_deref(), Some("Seminar"));
        assert_eq!(ev("Hackathon 2025/03/14").as_deref(), Some("Hackathon"));
    }

    #[test]
    fn presents_lead_in() {
        let t = ev("The Drama Society proudly presents: A Midsummer Night's Dream on Friday");
        assert_eq!(t.as_deref(), Some("A Midsummer Night's Dream"));
    }

    #[test]
    fn noun_tailed_clause() {
        let t = ev("Join us for the Annual Cultural Festival on April 2nd");
        assert_eq!(t.as_deref(), Some("Annual Cultural Festival"));
    }

    #[test]
    fn year_phrase() {
        let t = ev("TechFest 2025 is back with robots");
        assert_eq!(t.as_deref(), Some("TechFest 2025"));
    }

    #[test]
    fn fallback_truncates_first_line() {
        let line = "we are collecting old textbooks for donation to the local library next month";
        let t = ev(line).unwrap();
        assert_eq!(t.chars().count(), MAX_FALLBACK_TITLE_CHARS);
        assert!(t.starts_with("We Are Collecting"));
        assert!(t.ends_with("..."));
        let (_, origin) = extract_title_with_origin(line, TitleRules::Event).unwrap();
        assert_eq!(origin, FieldOrigin::Inferred);
    }

    #[test]
    fn field_lines_are_not_titles() {
        let t = ev("Venue: Conference Hall\nDate: 2025-04-01\nRobotics showcase for juniors");
        assert_eq!(t.as_deref(), Some("Robotics Showcase For Juniors"));
    }

    #[test]
    fn empty_and_greeting_only() {
        assert_eq!(ev(""), None);
        assert_eq!(ev("   \n  "), None);
        assert_eq!(ev("Hi all,\nGood morning!"), None);
    }

    #[test]
    fn resource_rules_skip_subject_label() {
        let t = extract_title("Subject: Physics\nThermodynamics formula sheet", TitleRules::Resource);
        assert_eq!(t.as_deref(), Some("Thermodynamics Formula Sheet"));
        let t = extract_title("Name: kinematics notes", TitleRules::Resource);
        assert_eq!(t.as_deref(), Some("Kinematics Notes"));
    }
}
