// src/record.rs
//! Record shapes handed to and returned from the extractor.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which record the caller wants out of a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Event,
    Resource,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Event => "event",
            RecordKind::Resource => "resource",
        }
    }
}

/// One extraction request. Created per call and consumed once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionInput {
    pub text: String,
    pub kind: RecordKind,
}

impl ExtractionInput {
    pub fn new(text: impl Into<String>, kind: RecordKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }
}

/// Complete event record. Required fields are always non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub title: String,
    pub description: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`, 24-hour
    pub time: String,
    pub location: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organizer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_details: Option<String>,
}

impl EventRecord {
    /// Combined `YYYY-MM-DD HH:MM` form used by the dashboard listing.
    pub fn scheduled_at(&self) -> String {
        format!("{} {}", self.date, self.time)
    }
}

/// Complete study-resource record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub subject: String,
    pub url: String,
}

/// Event fields as they arrive from a manual form or the field extractors.
/// Every field is optional; empty strings count as missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialEvent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub website_url: Option<String>,
    pub registration_link: Option<String>,
    pub organizer: Option<String>,
    pub contact_info: Option<String>,
    pub application_method: Option<String>,
    pub additional_details: Option<String>,
}

/// Resource fields as they arrive from a manual form or the field extractors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialResource {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    pub subject: Option<String>,
    pub url: Option<String>,
}

impl From<EventRecord> for PartialEvent {
    fn from(r: EventRecord) -> Self {
        Self {
            title: Some(r.title),
            description: Some(r.description),
            date: Some(r.date),
            time: Some(r.time),
            location: Some(r.location),
            category: Some(r.category),
            website_url: r.website_url,
            registration_link: r.registration_link,
            organizer: r.organizer,
            contact_info: r.contact_info,
            application_method: r.application_method,
            additional_details: r.additional_details,
        }
    }
}

impl From<ResourceRecord> for PartialResource {
    fn from(r: ResourceRecord) -> Self {
        Self {
            title: Some(r.title),
            description: Some(r.description),
            resource_type: Some(r.resource_type),
            subject: Some(r.subject),
            url: Some(r.url),
        }
    }
}

/// How a field got its final value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldOrigin {
    /// Found explicitly in the text (or supplied by the form).
    Extracted,
    /// Derived from other content, e.g. keyword scoring or the whole text.
    Inferred,
    /// Filled with a configured default.
    Defaulted,
}

/// Per-field origins, keyed by field name. Only fields with a value appear.
pub type FieldOrigins = BTreeMap<&'static str, FieldOrigin>;

/// A record plus the origin of each of its fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extraction<R> {
    pub record: R,
    pub origins: FieldOrigins,
}

impl<R> Extraction<R> {
    /// Names of the fields the validator had to default.
    pub fn defaulted_fields(&self) -> Vec<&'static str> {
        self.origins
            .iter()
            .filter(|(_, o)| **o == FieldOrigin::Defaulted)
            .map(|(k, _)| *k)
            .collect()
    }

    pub fn origin(&self, field: &str) -> Option<FieldOrigin> {
        self.origins.get(field).copied()
    }
}

/// Result of [`crate::extract::Extractor::extract`], tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Extracted {
    Event(Extraction<EventRecord>),
    Resource(Extraction<ResourceRecord>),
}

impl Extracted {
    pub fn kind(&self) -> RecordKind {
        match self {
            Extracted::Event(_) => RecordKind::Event,
            Extracted::Resource(_) => RecordKind::Resource,
        }
    }

    pub fn into_event(self) -> Option<Extraction<EventRecord>> {
        match self {
            Extracted::Event(e) => Some(e),
            Extracted::Resource(_) => None,
        }
    }

    pub fn into_resource(self) -> Option<Extraction<ResourceRecord>> {
        match self {
            Extracted::Resource(r) => Some(r),
            Extracted::Event(_) => None,
        }
    }
}

/// Treat `None`, `""` and whitespace-only as missing; otherwise trimmed.
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
