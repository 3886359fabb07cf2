//! Structured search filters and their compilation into engine predicates
//!
//! A [`FilterSet`] is what query understanding extracts from the user's text.
//! [`FilterCompiler`] turns it into a [`CompiledPredicate`], the AND of
//! per-field phrase conditions plus at most one publication date range.

mod compiler;
mod predicate;

pub use compiler::FilterCompiler;
pub use predicate::{CompiledPredicate, Condition, PUBLICATION_DATE_FIELD};

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Filterable text fields recognized in job payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterField {
    Category,
    Level,
    Company,
    Location,
}

impl FilterField {
    pub const ALL: [FilterField; 4] = [
        FilterField::Category,
        FilterField::Level,
        FilterField::Company,
        FilterField::Location,
    ];

    /// Payload key as stored in the index
    pub fn as_key(&self) -> &'static str {
        match self {
            FilterField::Category => "category",
            FilterField::Level => "Level",
            FilterField::Company => "company",
            FilterField::Location => "location",
        }
    }

    /// Case-insensitive lookup; generative output is not reliable about casing
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_key().eq_ignore_ascii_case(key.trim()))
    }
}

/// Publication date bounds; `None` means unbounded on that side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub gte: Option<DateTime<Utc>>,
    pub lte: Option<DateTime<Utc>>,
    pub gt: Option<DateTime<Utc>>,
    pub lt: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Closed interval `[now - days, now]`, truncated to whole seconds
    ///
    /// Returns `None` for non-positive or unrepresentable day counts.
    pub fn last_days(days: i64, now: DateTime<Utc>) -> Option<Self> {
        if days <= 0 {
            return None;
        }
        let now = truncate_to_seconds(now);
        let span = Duration::try_days(days)?;
        let start = now.checked_sub_signed(span)?;
        Some(Self {
            gte: Some(start),
            lte: Some(now),
            gt: None,
            lt: None,
        })
    }

    pub fn is_unbounded(&self) -> bool {
        self.gte.is_none() && self.lte.is_none() && self.gt.is_none() && self.lt.is_none()
    }

    /// True when no timestamp can satisfy both a lower and an upper bound
    pub fn is_inverted(&self) -> bool {
        let lower = self.gte.into_iter().chain(self.gt).max();
        let upper = self.lte.into_iter().chain(self.lt).min();
        match (lower, upper) {
            (Some(lower), Some(upper)) => {
                lower > upper || (lower == upper && (self.gt.is_some() || self.lt.is_some()))
            }
            _ => false,
        }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.gte.map_or(true, |b| ts >= b)
            && self.lte.map_or(true, |b| ts <= b)
            && self.gt.map_or(true, |b| ts > b)
            && self.lt.map_or(true, |b| ts < b)
    }

    /// Bounds as RFC 3339 strings with a `Z` suffix, nulls kept
    pub fn to_json(&self) -> Value {
        json!({
            "gte": self.gte.map(format_timestamp),
            "lte": self.lte.map(format_timestamp),
            "gt": self.gt.map(format_timestamp),
            "lt": self.lt.map(format_timestamp),
        })
    }
}

fn truncate_to_seconds(ts: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(ts.timestamp(), 0).unwrap_or(ts)
}

/// Format a timestamp the way the index stores `publication_date`
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a stored publication date. Accepts RFC 3339, naive datetimes and plain dates.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Structured filters extracted from a query
///
/// Keys are held in a fixed order, so two sets with the same entries are equal
/// and compile identically no matter how they were built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    fields: BTreeMap<FilterField, String>,
    date_range: Option<DateRange>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, field: FilterField, value: impl Into<String>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.set_date_range(range);
        self
    }

    /// Insert a field value. Blank and "null" values are pruned; returns whether
    /// the value was kept.
    pub fn insert(&mut self, field: FilterField, value: impl Into<String>) -> bool {
        let value = value.into();
        let trimmed = value.trim();
        if is_null_like(trimmed) {
            self.fields.remove(&field);
            return false;
        }
        self.fields.insert(field, trimmed.to_string());
        true
    }

    /// Set the date range. A range with no bounds is pruned.
    pub fn set_date_range(&mut self, range: DateRange) -> bool {
        if range.is_unbounded() {
            self.date_range = None;
            return false;
        }
        self.date_range = Some(range);
        true
    }

    pub fn get(&self, field: FilterField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    pub fn date_range(&self) -> Option<&DateRange> {
        self.date_range.as_ref()
    }

    /// Text fields in canonical order
    pub fn fields(&self) -> impl Iterator<Item = (FilterField, &str)> {
        self.fields.iter().map(|(field, value)| (*field, value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len() + usize::from(self.date_range.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// JSON view keyed by payload field names, for logs and CLI output
    pub fn to_json(&self) -> Value {
        let mut map = serde_json::Map::new();
        for (field, value) in self.fields() {
            map.insert(field.as_key().to_string(), Value::String(value.to_string()));
        }
        if let Some(range) = &self.date_range {
            map.insert("date_range".to_string(), range.to_json());
        }
        Value::Object(map)
    }
}

/// Values the generative model uses to mean "no filter"
pub(crate) fn is_null_like(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.eq_ignore_ascii_case("null") || value.eq_ignore_ascii_case("none")
}
