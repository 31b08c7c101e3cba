// src/extract/classify.rs
//! Keyword-overlap classification against an injected [`KeywordTable`].
//!
//! Explicit values ("Category: sports night") are mapped to the closest member:
//! exact → substring (either direction) → keyword overlap → near spelling.
//! Without a usable explicit value the whole text is scored. Most hits wins;
//! ties and zero hits resolve to the table's fallback member.

use crate::record::FieldOrigin;
use crate::taxonomy::KeywordTable;
use crate::text::{contains_word_prefix, normalize};

/// Minimum Jaro-Winkler similarity for a misspelt label ("Acadmic") to count.
const NEAR_SPELLING: f64 = 0.92;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Always a member of the table.
    pub value: String,
    /// Keyword hits of the winning member (0 for exact/substring/fallback).
    pub hits: usize,
    pub origin: FieldOrigin,
}

impl KeywordTable {
    /// Keyword hits per member, in table order.
    pub fn score(&self, text: &str) -> Vec<usize> {
        let hay = normalize(text);
        self.classes
            .iter()
            .map(|c| {
                c.keywords
                    .iter()
                    .filter(|kw| contains_word_prefix(&hay, kw))
                    .count()
            })
            .collect()
    }

    /// Index and hit count of the single best-scoring member, if there is one.
    fn unique_best(&self, text: &str) -> Option<(usize, usize)> {
        let scores = self.score(text);
        let max = scores.iter().copied().max().unwrap_or(0);
        if max == 0 || scores.iter().filter(|&&s| s == max).count() != 1 {
            return None;
        }
        scores.iter().position(|&s| s == max).map(|i| (i, max))
    }

    /// Map a free-text label value to a member, or `None` if nothing is close.
    pub fn closest(&self, value: &str) -> Option<String> {
        let v = normalize(value);
        if v.is_empty() {
            return None;
        }

        // 1) Exact (case-insensitive)
        if let Some(m) = self.member(&v) {
            return Some(m.to_string());
        }

        // 2) Substring either way ("sports night" ⊇ "sports", "acad" ⊆ "academic")
        for c in &self.classes {
            let name = c.name.to_lowercase();
            if v.contains(name.as_str()) || (v.chars().count() >= 3 && name.contains(v.as_str()))
            {
                return Some(c.name.clone());
            }
        }

        // 3) Keyword overlap on the value itself
        if let Some((i, _)) = self.unique_best(&v) {
            return Some(self.classes[i].name.clone());
        }

        // 4) Near spelling
        self.classes
            .iter()
            .map(|c| (c, strsim::jaro_winkler(&v, &c.name.to_lowercase())))
            .filter(|(_, sim)| *sim >= NEAR_SPELLING)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(c, _)| c.name.clone())
    }

    /// Classify `text`, honouring an explicit label value when it maps to a member.
    pub fn classify(&self, text: &str, explicit: Option<&str>) -> Classification {
        if let Some(value) = explicit.filter(|v| !v.trim().is_empty()) {
            if let Some(m) = self.closest(value) {
                return Classification {
                    value: m,
                    hits: 0,
                    origin: FieldOrigin::Extracted,
                };
            }
        }

        match self.unique_best(text) {
            Some((i, hits)) => Classification {
                value: self.classes[i].name.clone(),
                hits,
                origin: FieldOrigin::Inferred,
            },
            None => Classification {
                value: self.fallback_member(),
                hits: 0,
                origin: FieldOrigin::Defaulted,
            },
        }
    }

    /// The fallback in its canonical member spelling.
    pub fn fallback_member(&self) -> String {
        self.member(&self.fallback)
            .unwrap_or(self.fallback.as_str())
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::Taxonomy;

    fn cats() -> KeywordTable {
        Taxonomy::default().categories
    }

    #[test]
    fn scores_by_keyword_hits() {
        let t = cats();
        let c = t.classify("Annual music festival with dance and art", None);
        assert_eq!(c.value, "Cultural");
        assert_eq!(c.hits, 4);
        assert_eq!(c.origin, FieldOrigin::Inferred);
    }

    #[test]
    fn zero_hits_fall_back() {
        let c = cats().classify("bring snacks", None);
        assert_eq!(c.value, "Other");
        assert_eq!(c.origin, FieldOrigin::Defaulted);
    }

    #[test]
    fn ties_fall_back() {
        // one Sports keyword, one Career keyword
        let c = cats().classify("game then interview", None);
        assert_eq!(c.value, "Other");
    }

    #[test]
    fn explicit_exact_and_substring() {
        let t = cats();
        assert_eq!(t.classify("", Some("sports")).value, "Sports");
        assert_eq!(t.classify("", Some("Sports night")).value, "Sports");
        assert_eq!(t.classify("", Some("acad")).value, "Academic");
        assert_eq!(
            t.classify("", Some("Career")).origin,
            FieldOrigin::Extracted
        );
    }

    #[test]
    fn explicit_keyword_overlap_and_spelling() {
        let t = cats();
        assert_eq!(t.classify("", Some("guest lecture")).value, "Academic");
        assert_eq!(t.classify("", Some("Acadmic")).value, "Academic");
    }

    #[test]
    fn unusable_label_falls_through_to_text() {
        let t = cats();
        let c = t.classify("chess tournament and championship", Some("zzz"));
        assert_eq!(c.value, "Sports");
        assert_eq!(c.origin, FieldOrigin::Inferred);
    }

    #[test]
    fn keywords_match_at_word_starts_only() {
        // "start" must not count as the Cultural keyword "art"
        let c = cats().classify("we start soon", None);
        assert_eq!(c.value, "Other");
    }

    #[test]
    fn resource_tables() {
        let t = Taxonomy::default();
        let text = "Calculus II midterm practice test with solutions";
        assert_eq!(t.resource_types.classify(text, None).value, "Test Paper");
        assert_eq!(t.subjects.classify(text, None).value, "Mathematics");
        assert_eq!(t.subjects.classify("misc", None).value, "General");
    }
}
