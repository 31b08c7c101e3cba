// src/extract/mod.rs
//! Field extraction pipeline: per-field extractors over the raw text, then
//! the validator fills whatever is still missing.
//!
//! Extraction is pure. `extract_on` takes "today" explicitly so results are
//! reproducible; `extract` uses the local date.

pub mod classify;
pub mod datetime;
pub mod labels;
pub mod links;
pub mod location;
pub mod patterns;
pub mod title;
pub mod validate;

use std::sync::Arc;

use chrono::NaiveDate;
use metrics::counter;

use crate::record::{
    EventRecord, Extracted, Extraction, ExtractionInput, FieldOrigin, PartialEvent,
    PartialResource, RecordKind, ResourceRecord,
};
use crate::taxonomy::Taxonomy;
use crate::text::dev_log_extraction;

pub use classify::Classification;
pub use datetime::{extract_date_time, DateTimeHit};
pub use links::{extract_links, Links};
pub use location::extract_location;
pub use title::{extract_title, TitleRules};
use validate::OriginHints;

/// Today's date in local time.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Extractor bound to one taxonomy snapshot. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Extractor {
    taxonomy: Arc<Taxonomy>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(Taxonomy::default())
    }
}

impl Extractor {
    pub fn new(taxonomy: Taxonomy) -> Self {
        Self {
            taxonomy: Arc::new(taxonomy),
        }
    }

    pub fn from_shared(taxonomy: Arc<Taxonomy>) -> Self {
        Self { taxonomy }
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    pub fn extract(&self, input: &ExtractionInput) -> Extracted {
        self.extract_on(input, today())
    }

    pub fn extract_on(&self, input: &ExtractionInput, today: NaiveDate) -> Extracted {
        let out = match input.kind {
            RecordKind::Event => Extracted::Event(self.extract_event(&input.text, today)),
            RecordKind::Resource => Extracted::Resource(self.extract_resource(&input.text)),
        };

        let defaulted = match &out {
            Extracted::Event(e) => e.defaulted_fields(),
            Extracted::Resource(r) => r.defaulted_fields(),
        };
        counter!("extractions_total", "kind" => input.kind.as_str()).increment(1);
        for field in &defaulted {
            counter!("fields_defaulted_total", "field" => *field).increment(1);
        }
        dev_log_extraction("extracted", &input.text, input.kind.as_str(), &defaulted);
        out
    }

    pub fn extract_event(&self, text: &str, today: NaiveDate) -> Extraction<EventRecord> {
        let tax = self.taxonomy();
        let mut hints = OriginHints::new();

        let title = title::extract_title_with_origin(text, TitleRules::Event).map(|(t, origin)| {
            hints.insert("title", origin);
            t
        });
        let description = labels::extract_description(text).map(|(d, origin)| {
            hints.insert("description", origin);
            d
        });
        let when = extract_date_time(text, today);
        let category = tax.categories.classify(text, labels::category_label(text));
        hints.insert("category", category.origin);
        let links = extract_links(text, &tax.links.registration_keywords);

        let partial = PartialEvent {
            title,
            description,
            date: when.date_string(),
            time: when.time_string(),
            location: extract_location(text),
            category: (category.origin != FieldOrigin::Defaulted).then_some(category.value),
            website_url: links.website_url,
            registration_link: links.registration_link,
            organizer: links.organizer,
            contact_info: links.contact_info,
            application_method: links.application_method,
            additional_details: labels::extract_additional_details(text),
        };
        self.finish_event(&partial, &hints, today)
    }

    pub fn extract_resource(&self, text: &str) -> Extraction<ResourceRecord> {
        let tax = self.taxonomy();
        let mut hints = OriginHints::new();

        let title = title::extract_title_with_origin(text, TitleRules::Resource).map(|(t, origin)| {
            hints.insert("title", origin);
            t
        });
        let description = labels::extract_description(text).map(|(d, origin)| {
            hints.insert("description", origin);
            d
        });

        let kind = tax.resource_types.classify(text, labels::type_label(text));
        hints.insert("type", kind.origin);

        let subject = match labels::subject_label(text) {
            Some(s) => Some(tax.subjects.closest(s).unwrap_or_else(|| s.to_string())),
            None => {
                let c = tax.subjects.classify(text, None);
                hints.insert("subject", c.origin);
                (c.origin != FieldOrigin::Defaulted).then_some(c.value)
            }
        };

        let partial = PartialResource {
            title,
            description,
            resource_type: (kind.origin != FieldOrigin::Defaulted).then_some(kind.value),
            subject,
            url: links::first_url(text),
        };
        self.finish_resource(&partial, &hints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()
    }

    #[test]
    fn event_origins_distinguish_found_inferred_defaulted() {
        let ex = Extractor::default();
        let out = ex.extract_event("Chess tournament on March 3 at 6 pm", day());
        assert_eq!(out.record.title, "Chess Tournament");
        assert_eq!(out.record.date, "2025-03-03");
        assert_eq!(out.record.time, "18:00");
        assert_eq!(out.record.category, "Sports");
        assert_eq!(out.origin("title"), Some(FieldOrigin::Extracted));
        assert_eq!(out.origin("description"), Some(FieldOrigin::Inferred));
        assert_eq!(out.origin("category"), Some(FieldOrigin::Inferred));
        assert_eq!(out.origin("location"), Some(FieldOrigin::Defaulted));
    }

    #[test]
    fn explicit_category_label_is_extracted() {
        let ex = Extractor::default();
        let out = ex.extract_event("Title: Movie night\nCategory: cultural evening", day());
        assert_eq!(out.record.category, "Cultural");
        assert_eq!(out.origin("category"), Some(FieldOrigin::Extracted));
    }

    #[test]
    fn resource_subject_label_and_url() {
        let ex = Extractor::default();
        let out = ex.extract_resource(
            "Title: optics revision\nSubject: physics\nType: notes\nURL: drive.example.com/optics",
        );
        let r = &out.record;
        assert_eq!(r.title, "Optics Revision");
        assert_eq!(r.subject, "Physics");
        assert_eq!(r.resource_type, "Notes");
        assert_eq!(r.url, "https://drive.example.com/optics");
        assert_eq!(out.origin("url"), Some(FieldOrigin::Extracted));
    }

    #[test]
    fn extract_dispatches_on_kind() {
        let ex = Extractor::default();
        let out = ex.extract_on(&ExtractionInput::new("", RecordKind::Resource), day());
        assert_eq!(out.kind(), RecordKind::Resource);
        let r = out.into_resource().unwrap();
        assert_eq!(r.record.title, "Untitled Resource");
        assert_eq!(r.record.url, "https://example.com/resources/notes/general");
    }
}
