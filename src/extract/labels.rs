// src/extract/labels.rs
//! Label-driven fields: description, organizer, contact, application method,
//! additional details, and the raw `category:` / `type:` / `subject:` values
//! that the classifier maps onto its tables.

use once_cell::sync::Lazy;
use regex::Regex;

use super::patterns::clip_clause;
use crate::record::FieldOrigin;

static DESCRIPTION_ANYWHERE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bdescription[ \t]*:[ \t]*([^\n]+)").expect("description regex")
});

/// `about:` and `details:` are common inside prose, so only count at a line start.
static DESCRIPTION_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^[ \t]*(?:about|details)[ \t]*:[ \t]*([^\n]+)").expect("about regex")
});

static ADDITIONAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\badditional\s+(?:details|info|information)[ \t]*:[ \t]*([^\n]+)")
        .expect("additional details regex")
});

static ORGANIZER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:organi[sz]ed\s+by|organi[sz]er|hosted\s+by|presented\s+by)(?:[ \t]*:[ \t]*|[ \t]+)([^\n]+)")
        .expect("organizer regex")
});

static CONTACT: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\bcontact\s+(?:info(?:rmation)?|person|details)(?:[ \t]*:[ \t]*|[ \t]+)([^\n]+)",
        r"(?i)\bcontact(?:[ \t]*:[ \t]*|[ \t]+)(?:us[ \t]+(?:at|on)[ \t]+)?([^\n]+)",
        r"(?i)\be-?mail(?:[ \t]+us)?(?:[ \t]*:[ \t]*|[ \t]+(?:at[ \t]+)?)([^\n]+)",
        r"(?i)\b(?:(?:tele)?phone|tel|call(?:[ \t]+us)?(?:[ \t]+(?:at|on))?)[ \t]*:?[ \t]*(\+?\d[\d \t().-]{5,}\d)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("contact regex"))
    .collect()
});

static BARE_EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\w.+-]+@[\w-]+(?:\.[\w-]+)+").expect("email regex")
});

static CONTACT_FILLER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s+(?:for\s+(?:more\s+)?(?:details|info(?:rmation)?|queries|questions)|if\s+you\s+have\s+.*)$")
        .expect("contact filler regex")
});

static APPLICATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:how\s+to\s+apply|apply\s+by|application\s+process|register\s+by)(?:[ \t]*:[ \t]*|[ \t]+)([^\n]+)")
        .expect("application regex")
});

static CATEGORY_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:event\s+type|category|type)[ \t]*:[ \t]*([^\n.;]+)").expect("category label regex")
});

static TYPE_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:resource\s+)?type[ \t]*:[ \t]*([^\n.;]+)").expect("type label regex")
});

static SUBJECT_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bsubject[ \t]*:[ \t]*([^\n.;]+)").expect("subject label regex")
});

fn first_capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|v| !v.is_empty())
}

/// Short person/org style value: its own clause, cut at the first comma.
fn short_value(raw: &str) -> Option<String> {
    let clause = clip_clause(raw);
    let head = clause.split(',').next().unwrap_or_default().trim();
    (!head.is_empty()).then(|| head.to_string())
}

/// Labelled description (`Extracted`), else the whole text (`Inferred`).
pub fn extract_description(text: &str) -> Option<(String, FieldOrigin)> {
    if let Some(v) = first_capture(&DESCRIPTION_ANYWHERE, text)
        .or_else(|| first_capture(&DESCRIPTION_LINE, text))
    {
        return Some((v.to_string(), FieldOrigin::Extracted));
    }
    let whole = text.trim();
    (!whole.is_empty()).then(|| (whole.to_string(), FieldOrigin::Inferred))
}

pub fn extract_additional_details(text: &str) -> Option<String> {
    first_capture(&ADDITIONAL, text).map(str::to_string)
}

pub fn extract_organizer(text: &str) -> Option<String> {
    first_capture(&ORGANIZER, text).and_then(short_value)
}

pub fn extract_contact(text: &str) -> Option<String> {
    for re in CONTACT.iter() {
        if let Some(v) = first_capture(re, text).and_then(short_value) {
            let v = CONTACT_FILLER.replace(&v, "").trim().to_string();
            if !v.is_empty() {
                return Some(v);
            }
        }
    }
    BARE_EMAIL.find(text).map(|m| m.as_str().to_string())
}

pub fn extract_application_method(text: &str) -> Option<String> {
    first_capture(&APPLICATION, text).and_then(short_value)
}

/// Raw `category:` / `event type:` / `type:` value for events.
pub fn category_label(text: &str) -> Option<&str> {
    first_capture(&CATEGORY_LABEL, text)
}

pub fn type_label(text: &str) -> Option<&str> {
    first_capture(&TYPE_LABEL, text)
}

pub fn subject_label(text: &str) -> Option<&str> {
    first_capture(&SUBJECT_LABEL, text)
}
