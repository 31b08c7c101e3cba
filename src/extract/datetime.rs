// src/extract/datetime.rs
//! Date and time extraction.
//!
//! Dates are tried pattern by pattern in priority order; within a pattern the
//! first match that is a real calendar date wins, otherwise the next pattern
//! is tried. Times are converted to 24-hour `HH:MM`.

use chrono::{Datelike, Days, NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::patterns::{month_number, MONTHS};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateTimeHit {
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
}

impl DateTimeHit {
    pub fn date_string(&self) -> Option<String> {
        self.date.map(|d| d.format(DATE_FORMAT).to_string())
    }

    pub fn time_string(&self) -> Option<String> {
        self.time.map(|t| t.format(TIME_FORMAT).to_string())
    }
}

#[derive(Clone, Copy)]
enum DateShape {
    /// year, month, day
    Ymd,
    /// day, month, year (day first)
    Dmy,
    /// month name, day, optional year
    MonthDay,
    /// day, month name, optional year
    DayMonth,
}

struct DatePattern {
    re: Regex,
    shape: DateShape,
}

static ORDINAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)\b").expect("ordinal regex"));

static DATE_PATTERNS: Lazy<Vec<DatePattern>> = Lazy::new(|| {
    let p = |re: &str, shape| DatePattern {
        re: Regex::new(re).expect("date regex"),
        shape,
    };
    vec![
        // 2025-03-15, 2025/3/15
        p(r"\b(\d{4})[-/](\d{1,2})[-/](\d{1,2})\b", DateShape::Ymd),
        // 15/03/2025
        p(r"\b(\d{1,2})[-/](\d{1,2})[-/](\d{4})\b", DateShape::Dmy),
        // March 15, 2025
        p(
            &format!(r"(?i)\b({MONTHS})\.?\s+(\d{{1,2}}),?\s+(\d{{4}})\b"),
            DateShape::MonthDay,
        ),
        // 15 March 2025
        p(
            &format!(r"(?i)\b(\d{{1,2}})\s+(?:of\s+)?({MONTHS})\.?,?\s+(\d{{4}})\b"),
            DateShape::DayMonth,
        ),
        // March 15
        p(
            &format!(r"(?i)\b({MONTHS})\.?\s+(\d{{1,2}})\b"),
            DateShape::MonthDay,
        ),
        // 15 March
        p(
            &format!(r"(?i)\b(\d{{1,2}})\s+(?:of\s+)?({MONTHS})\b"),
            DateShape::DayMonth,
        ),
    ]
});

static DATE_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:date|when|scheduled\s+(?:for|on)|will\s+be\s+held\s+on)[ \t]*:[ \t]*([^\n.;]+)")
        .expect("date label regex")
});

/// Meridiem is captured as `a` or `p`.
static TIME_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\bat\s+(\d{1,2})(?::(\d{2}))?\s*([ap])\.?m\b",
        r"(?i)\bfrom\s+(\d{1,2})(?::(\d{2}))?\s*([ap])\.?m\b",
        r"(?i)\btime[ \t]*:[ \t]*(\d{1,2})(?::(\d{2}))?\s*([ap])\.?m\b",
        r"(?i)\b(\d{1,2}):(\d{2})(?:\s*([ap])\.?m\b)?",
        r"(?i)\b(\d{1,2})()\s*([ap])\.?m\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("time regex"))
    .collect()
});

static COMBINED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d{4}[-/]\d{1,2}[-/]\d{1,2})(?:[T\s]+(\d{1,2}:\d{2}(?::\d{2})?(?:\s*[ap]\.?m\.?)?))?\s*$")
        .expect("combined date-time regex")
});

pub fn extract_date_time(text: &str, today: NaiveDate) -> DateTimeHit {
    DateTimeHit {
        date: extract_date(text, today),
        time: extract_time(text),
    }
}

/// First valid date in `text`; a missing year means `today`'s year.
pub fn extract_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    if let Some(d) = date_from_patterns(text, today) {
        return Some(d);
    }
    DATE_LABEL
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .find_map(|m| relative_day(m.as_str(), today))
}

/// Parse a single date value (form field or label value).
pub fn parse_date_value(value: &str, today: NaiveDate) -> Option<NaiveDate> {
    relative_day(value, today).or_else(|| date_from_patterns(value, today))
}

fn date_from_patterns(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let text = ORDINAL.replace_all(text, "${1}");
    DATE_PATTERNS.iter().find_map(|p| {
        p.re
            .captures_iter(&text)
            .find_map(|c| date_from_captures(&c, p.shape, today.year()))
    })
}

fn date_from_captures(c: &Captures<'_>, shape: DateShape, this_year: i32) -> Option<NaiveDate> {
    let num = |i: usize| c.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
    let year = |i: usize| {
        c.get(i)
            .and_then(|m| m.as_str().parse::<i32>().ok())
            .unwrap_or(this_year)
    };
    let (y, m, d) = match shape {
        DateShape::Ymd => (year(1), num(2)?, num(3)?),
        DateShape::Dmy => (year(3), num(2)?, num(1)?),
        DateShape::MonthDay => (year(3), month_number(c.get(1)?.as_str())?, num(2)?),
        DateShape::DayMonth => (year(3), month_number(c.get(2)?.as_str())?, num(1)?),
    };
    NaiveDate::from_ymd_opt(y, m, d)
}

fn relative_day(value: &str, today: NaiveDate) -> Option<NaiveDate> {
    match value.trim().to_lowercase().as_str() {
        "today" | "tonight" => Some(today),
        "tomorrow" => today.checked_add_days(Days::new(1)),
        _ => None,
    }
}

/// First valid time in `text`, as 24-hour.
pub fn extract_time(text: &str) -> Option<NaiveTime> {
    TIME_PATTERNS
        .iter()
        .find_map(|re| re.captures_iter(text).find_map(|c| time_from_captures(&c)))
}

/// Parse a single time value: `15:00`, `15:00:00`, `3pm`, `3:30 p.m.`.
pub fn parse_time_value(value: &str) -> Option<NaiveTime> {
    let v = value.trim();
    if let Ok(t) = NaiveTime::parse_from_str(v, "%H:%M:%S") {
        return Some(t);
    }
    extract_time(v)
}

fn time_from_captures(c: &Captures<'_>) -> Option<NaiveTime> {
    let mut hour: u32 = c.get(1)?.as_str().parse().ok()?;
    let minute: u32 = match c.get(2).map(|m| m.as_str()).filter(|m| !m.is_empty()) {
        Some(m) => m.parse().ok()?,
        None => 0,
    };
    match c.get(3).map(|m| m.as_str().to_ascii_lowercase()).as_deref() {
        Some("p") if hour < 12 => hour += 12,
        Some("a") if hour == 12 => hour = 0,
        _ => {}
    }
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Split a manual-form value like `2025-03-15 14:30` into its two halves.
/// Values that are not a combined date-time come back as `(Some(value), None)`.
pub fn split_date_time(value: &str) -> (Option<&str>, Option<&str>) {
    match COMBINED.captures(value) {
        Some(c) => (
            c.get(1).map(|m| m.as_str()),
            c.get(2).map(|m| m.as_str()),
        ),
        None => (Some(value.trim()).filter(|v| !v.is_empty()), None),
    }
}

/// `today` plus the configured offset, saturating at `today`.
pub fn default_date(today: NaiveDate, offset_days: i64) -> NaiveDate {
    u64::try_from(offset_days)
        .ok()
        .and_then(|n| today.checked_add_days(Days::new(n)))
        .unwrap_or(today)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
    }

    fn date(text: &str) -> Option<String> {
        extract_date(text, today()).map(|d| d.format(DATE_FORMAT).to_string())
    }

    fn time(text: &str) -> Option<String> {
        extract_time(text).map(|t| t.format(TIME_FORMAT).to_string())
    }

    #[test]
    fn iso_and_day_first() {
        assert_eq!(date("on 2025-3-7 in hall").as_deref(), Some("2025-03-07"));
        assert_eq!(date("on 2025/12/01").as_deref(), Some("2025-12-01"));
        assert_eq!(date("held 05/04/2025").as_deref(), Some("2025-04-05"));
    }

    #[test]
    fn month_names_with_ordinals_and_years() {
        assert_eq!(date("March 15th, 2026").as_deref(), Some("2026-03-15"));
        assert_eq!(date("the 2nd of April 2024").as_deref(), Some("2024-04-02"));
        assert_eq!(date("on March 15th at 3 PM").as_deref(), Some("2025-03-15"));
        assert_eq!(date("Sept 9").as_deref(), Some("2025-09-09"));
        assert_eq!(date("on 21 june").as_deref(), Some("2025-06-21"));
    }

    #[test]
    fn impossible_dates_fall_through() {
        // Feb 30 is rejected; the later day-month match is used instead
        assert_eq!(
            date("2025-02-30 or else 3 March").as_deref(),
            Some("2025-03-03")
        );
        assert_eq!(date("on 31/02/2025"), None);
    }

    #[test]
    fn labels_understand_relative_days() {
        assert_eq!(date("When: tomorrow").as_deref(), Some("2025-01-11"));
        assert_eq!(date("Date: today").as_deref(), Some("2025-01-10"));
        assert_eq!(date("Date: sometime soon"), None);
        assert_eq!(date("no date here"), None);
        // an empty label does not read the following line
        assert_eq!(date("Date:\ntomorrow"), None);
    }

    #[test]
    fn times() {
        assert_eq!(time("at 3 PM").as_deref(), Some("15:00"));
        assert_eq!(time("from 9:30am to noon").as_deref(), Some("09:30"));
        assert_eq!(time("Time: 7 p.m.").as_deref(), Some("19:00"));
        assert_eq!(time("starts 18:45").as_deref(), Some("18:45"));
        assert_eq!(time("starts 6:45 pm").as_deref(), Some("18:45"));
        assert_eq!(time("doors open 8pm").as_deref(), Some("20:00"));
        assert_eq!(time("at 12 am").as_deref(), Some("00:00"));
        assert_eq!(time("at 12 pm").as_deref(), Some("12:00"));
        assert_eq!(time("score 99:99 then 10:15").as_deref(), Some("10:15"));
        assert_eq!(time("amazing program"), None);
        assert_eq!(time("Time:\n7 pm").as_deref(), Some("19:00"));
    }

    #[test]
    fn combined_values_split() {
        assert_eq!(
            split_date_time("2025-03-15 14:30"),
            (Some("2025-03-15"), Some("14:30"))
        );
        assert_eq!(
            split_date_time("2025-03-15T09:00:00"),
            (Some("2025-03-15"), Some("09:00:00"))
        );
        assert_eq!(split_date_time("March 3"), (Some("March 3"), None));
        assert_eq!(split_date_time("  "), (None, None));
        assert_eq!(
            parse_time_value("15:00:00").map(|t| t.format(TIME_FORMAT).to_string()),
            Some("15:00".into())
        );
    }

    #[test]
    fn default_date_offsets() {
        assert_eq!(default_date(today(), 1).to_string(), "2025-01-11");
        assert_eq!(default_date(today(), 7).to_string(), "2025-01-17");
        assert_eq!(default_date(today(), -3), today());
    }
}
