// src/extract/validate.rs
//! Validator/defaulter: turns a partial record into a complete one.
//!
//! Used directly for manual form input and as the last stage of text
//! extraction. Never fails: missing or unusable values fall back to the
//! taxonomy defaults, enum fields always end up as table members.

use chrono::NaiveDate;

use super::datetime::{default_date, parse_date_value, parse_time_value, split_date_time, DATE_FORMAT, TIME_FORMAT};
use super::links::normalize_url;
use super::Extractor;
use crate::record::{
    present, EventRecord, Extraction, FieldOrigin, FieldOrigins, PartialEvent, PartialResource,
    ResourceRecord,
};
use crate::text::{capitalize_words, slugify};

/// Origins the extraction stage already knows (e.g. a description taken from
/// the whole text is `Inferred`). Fields without a hint count as `Extracted`.
pub(crate) type OriginHints = FieldOrigins;

struct Fields<'h> {
    hints: &'h OriginHints,
    origins: FieldOrigins,
}

impl<'h> Fields<'h> {
    fn new(hints: &'h OriginHints) -> Self {
        Self {
            hints,
            origins: FieldOrigins::new(),
        }
    }

    fn found(&mut self, field: &'static str) {
        let origin = self.hints.get(field).copied().unwrap_or(FieldOrigin::Extracted);
        self.origins.insert(field, origin);
    }

    fn set(&mut self, field: &'static str, origin: FieldOrigin) {
        self.origins.insert(field, origin);
    }

    /// Value if present, else `default` marked as defaulted.
    fn or_default(&mut self, field: &'static str, value: &Option<String>, default: &str) -> String {
        match present(value) {
            Some(v) => {
                self.found(field);
                v.to_string()
            }
            None => {
                self.set(field, FieldOrigin::Defaulted);
                default.to_string()
            }
        }
    }

    fn optional(&mut self, field: &'static str, value: &Option<String>) -> Option<String> {
        let v = present(value)?;
        self.found(field);
        Some(v.to_string())
    }

    fn optional_url(&mut self, field: &'static str, value: &Option<String>) -> Option<String> {
        let url = normalize_url(present(value)?)?;
        self.found(field);
        Some(url)
    }
}

impl Extractor {
    /// Complete an event from form input. Present fields count as extracted.
    pub fn validate_event(&self, partial: &PartialEvent, today: NaiveDate) -> Extraction<EventRecord> {
        self.finish_event(partial, &OriginHints::new(), today)
    }

    /// Complete a resource from form input.
    pub fn validate_resource(&self, partial: &PartialResource) -> Extraction<ResourceRecord> {
        self.finish_resource(partial, &OriginHints::new())
    }

    pub(crate) fn finish_event(
        &self,
        p: &PartialEvent,
        hints: &OriginHints,
        today: NaiveDate,
    ) -> Extraction<EventRecord> {
        let tax = self.taxonomy();
        let d = &tax.defaults;
        let mut f = Fields::new(hints);

        let title = match present(&p.title) {
            Some(t) => {
                f.found("title");
                capitalize_words(t)
            }
            None => {
                f.set("title", FieldOrigin::Defaulted);
                d.event_title.clone()
            }
        };
        let description = f.or_default("description", &p.description, &d.description);

        // A combined "YYYY-MM-DD HH:MM" date carries the time too.
        let (date_part, time_in_date) = present(&p.date).map_or((None, None), split_date_time);

        let date = match date_part.and_then(|v| parse_date_value(v, today)) {
            Some(parsed) => {
                f.found("date");
                parsed
            }
            None => {
                f.set("date", FieldOrigin::Defaulted);
                default_date(today, d.date_offset_days)
            }
        };

        let time = match present(&p.time)
            .or(time_in_date)
            .and_then(parse_time_value)
        {
            Some(parsed) => {
                f.found("time");
                parsed.format(TIME_FORMAT).to_string()
            }
            None => {
                f.set("time", FieldOrigin::Defaulted);
                d.time.clone()
            }
        };

        let location = f.or_default("location", &p.location, &d.location);

        let category = match present(&p.category).and_then(|c| tax.categories.member(c)) {
            Some(member) => {
                f.found("category");
                member.to_string()
            }
            None => {
                let basis = supplied_text(p.title.as_ref(), p.description.as_ref());
                let c = tax.categories.classify(&basis, present(&p.category));
                // re-inferred from title + description
                f.set("category", c.origin);
                c.value
            }
        };

        let record = EventRecord {
            title,
            description,
            date: date.format(DATE_FORMAT).to_string(),
            time,
            location,
            category,
            website_url: f.optional_url("website_url", &p.website_url),
            registration_link: f.optional_url("registration_link", &p.registration_link),
            organizer: f.optional("organizer", &p.organizer),
            contact_info: f.optional("contact_info", &p.contact_info),
            application_method: f.optional("application_method", &p.application_method),
            additional_details: f.optional("additional_details", &p.additional_details),
        };

        Extraction {
            record,
            origins: f.origins,
        }
    }

    pub(crate) fn finish_resource(
        &self,
        p: &PartialResource,
        hints: &OriginHints,
    ) -> Extraction<ResourceRecord> {
        let tax = self.taxonomy();
        let d = &tax.defaults;
        let mut f = Fields::new(hints);

        let title = match present(&p.title) {
            Some(t) => {
                f.found("title");
                capitalize_words(t)
            }
            None => {
                f.set("title", FieldOrigin::Defaulted);
                d.resource_title.clone()
            }
        };
        let description = f.or_default("description", &p.description, &d.description);
        let basis = supplied_text(p.title.as_ref(), p.description.as_ref());

        let resource_type = match present(&p.resource_type).and_then(|t| tax.resource_types.member(t)) {
            Some(member) => {
                f.found("type");
                member.to_string()
            }
            None => {
                let c = tax.resource_types.classify(&basis, present(&p.resource_type));
                f.set("type", c.origin);
                c.value
            }
        };

        // Subject is free text: a close table member is preferred, otherwise
        // the value is kept as given.
        let subject = match present(&p.subject) {
            Some(s) => {
                f.found("subject");
                tax.subjects.closest(s).unwrap_or_else(|| s.to_string())
            }
            None => {
                let c = tax.subjects.classify(&basis, None);
                f.set("subject", c.origin);
                c.value
            }
        };

        let url = match present(&p.url).and_then(normalize_url) {
            Some(u) => {
                f.found("url");
                u
            }
            None => {
                f.set("url", FieldOrigin::Defaulted);
                placeholder_url(&d.resource_url_base, &resource_type, &subject)
            }
        };

        Extraction {
            record: ResourceRecord {
                title,
                description,
                resource_type,
                subject,
                url,
            },
            origins: f.origins,
        }
    }
}

/// Title and description as supplied; configured defaults never feed re-inference.
fn supplied_text(title: Option<&String>, description: Option<&String>) -> String {
    [title, description]
        .into_iter()
        .flatten()
        .map(|s| s.trim())
        .collect::<Vec<_>>()
        .join(" ")
}

/// `{base}/{type-slug}/{subject-slug}`
pub fn placeholder_url(base: &str, resource_type: &str, subject: &str) -> String {
    format!(
        "{}/{}/{}",
        base.trim_end_matches('/'),
        slugify(resource_type),
        slugify(subject)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::Taxonomy;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn ex() -> Extractor {
        Extractor::new(Taxonomy::default())
    }

    #[test]
    fn empty_event_is_fully_defaulted() {
        let out = ex().validate_event(&PartialEvent::default(), today());
        let r = &out.record;
        assert_eq!(r.title, "New Event");
        assert_eq!(r.description, "No description provided.");
        assert_eq!(r.date, "2025-06-02");
        assert_eq!(r.time, "15:00");
        assert_eq!(r.location, "Main Campus");
        assert_eq!(r.category, "Other");
        assert!(r.website_url.is_none() && r.registration_link.is_none());
        assert_eq!(
            out.defaulted_fields(),
            vec!["category", "date", "description", "location", "time", "title"]
        );
    }

    #[test]
    fn combined_date_time_is_split_and_canonicalised() {
        let p = PartialEvent {
            title: Some("chess night".into()),
            date: Some("2025-07-04 18:30".into()),
            ..PartialEvent::default()
        };
        let out = ex().validate_event(&p, today());
        assert_eq!(out.record.title, "Chess Night");
        assert_eq!(out.record.date, "2025-07-04");
        assert_eq!(out.record.time, "18:30");
        assert_eq!(out.origin("time"), Some(FieldOrigin::Extracted));

        let p = PartialEvent {
            date: Some("not a date".into()),
            time: Some("15:00:00".into()),
            ..PartialEvent::default()
        };
        let out = ex().validate_event(&p, today());
        assert_eq!(out.record.date, "2025-06-02");
        assert_eq!(out.origin("date"), Some(FieldOrigin::Defaulted));
        assert_eq!(out.record.time, "15:00");
    }

    #[test]
    fn category_is_mapped_or_reinferred() {
        let p = PartialEvent {
            category: Some("sports".into()),
            ..PartialEvent::default()
        };
        assert_eq!(ex().validate_event(&p, today()).record.category, "Sports");

        let p = PartialEvent {
            title: Some("Guest lecture on quantum computing".into()),
            category: Some("zzz".into()),
            ..PartialEvent::default()
        };
        let out = ex().validate_event(&p, today());
        assert_eq!(out.record.category, "Academic");
        assert_eq!(out.origin("category"), Some(FieldOrigin::Inferred));
    }

    #[test]
    fn invalid_urls_are_dropped() {
        let p = PartialEvent {
            website_url: Some("not a url".into()),
            registration_link: Some("forms.example.com/signup".into()),
            ..PartialEvent::default()
        };
        let out = ex().validate_event(&p, today());
        assert_eq!(out.record.website_url, None);
        assert_eq!(
            out.record.registration_link.as_deref(),
            Some("https://forms.example.com/signup")
        );
        assert_eq!(out.origin("website_url"), None);
    }

    #[test]
    fn resource_defaults_and_placeholder_url() {
        let out = ex().validate_resource(&PartialResource::default());
        let r = &out.record;
        assert_eq!(r.title, "Untitled Resource");
        assert_eq!(r.resource_type, "Notes");
        assert_eq!(r.subject, "General");
        assert_eq!(r.url, "https://example.com/resources/notes/general");
    }

    #[test]
    fn resource_type_and_subject_inferred_from_title() {
        let p = PartialResource {
            title: Some("organic chemistry past paper".into()),
            ..PartialResource::default()
        };
        let out = ex().validate_resource(&p);
        assert_eq!(out.record.resource_type, "Test Paper");
        assert_eq!(out.record.subject, "Chemistry");
        assert_eq!(
            out.record.url,
            "https://example.com/resources/test-paper/chemistry"
        );

        let p = PartialResource {
            subject: Some("Philosophy".into()),
            resource_type: Some("TIMETABLE".into()),
            url: Some("https://cdn.example.com/a.pdf".into()),
            ..PartialResource::default()
        };
        let out = ex().validate_resource(&p);
        assert_eq!(out.record.resource_type, "Timetable");
        assert_eq!(out.record.subject, "Philosophy");
        assert_eq!(out.record.url, "https://cdn.example.com/a.pdf");

        let p = PartialResource {
            subject: Some("astrophysics".into()),
            ..PartialResource::default()
        };
        assert_eq!(ex().validate_resource(&p).record.subject, "Physics");
    }
}
