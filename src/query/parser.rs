//! Interpretation of the oracle's query-parsing reply
//!
//! The reply is untrusted text. Anything that does not fit the expected shape is
//! dropped field by field, and a reply that is not JSON at all is reported as
//! unparseable rather than guessed at.

use crate::filter::{is_null_like, parse_timestamp, DateRange, FilterField, FilterSet};
use crate::query::{ParseFailure, ParsedQuery};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Locate the JSON object in a reply: first `{` through last `}`
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}

/// Turn the oracle's reply into a parsed query
///
/// A reply without a usable `semantic_query` yields the raw query verbatim with
/// no filters.
pub fn interpret_response(
    raw_query: &str,
    response: &str,
    now: DateTime<Utc>,
) -> Result<ParsedQuery, ParseFailure> {
    let json_str = extract_json_object(response).ok_or_else(|| {
        ParseFailure::UnparseableResponse("No JSON object found in oracle response".to_string())
    })?;

    let value: Value = serde_json::from_str(json_str)
        .map_err(|e| ParseFailure::UnparseableResponse(format!("JSON parsing error: {}", e)))?;

    let Value::Object(object) = value else {
        return Err(ParseFailure::UnparseableResponse(
            "Expected a JSON object".to_string(),
        ));
    };

    let semantic_query = object
        .get("semantic_query")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !is_null_like(s));

    let Some(semantic_query) = semantic_query else {
        tracing::warn!("Oracle returned no semantic query, using the raw query without filters");
        return Ok(ParsedQuery::verbatim(raw_query));
    };

    let filters = match object.get("filters") {
        Some(Value::Object(map)) => build_filters(map, now),
        Some(Value::Null) | None => FilterSet::new(),
        Some(other) => {
            tracing::debug!("Ignoring non-object filters: {}", other);
            FilterSet::new()
        }
    };

    Ok(ParsedQuery {
        semantic_query: semantic_query.to_string(),
        filters,
    })
}

fn build_filters(map: &Map<String, Value>, now: DateTime<Utc>) -> FilterSet {
    let mut filters = FilterSet::new();

    for (key, value) in map {
        if key == "date_range" {
            match resolve_date_range(value, now) {
                Some(range) => {
                    tracing::debug!("Converted date_range to {}", range.to_json());
                    filters.set_date_range(range);
                }
                None if value.is_null() => {}
                None => tracing::debug!("Dropping unusable date_range: {}", value),
            }
            continue;
        }

        let Some(field) = FilterField::from_key(key) else {
            tracing::debug!("Dropping unrecognized filter key: {}", key);
            continue;
        };

        match value {
            Value::String(text) => {
                if !filters.insert(field, text.as_str()) {
                    tracing::debug!("Dropping empty filter: {}", key);
                }
            }
            Value::Null => {}
            other => tracing::debug!("Dropping non-text filter {}: {}", key, other),
        }
    }

    filters
}

/// Resolve the oracle's date expression into absolute bounds
///
/// Accepts `{"days": N}`, a bare day count, or already-resolved bounds.
fn resolve_date_range(value: &Value, now: DateTime<Utc>) -> Option<DateRange> {
    match value {
        Value::Object(map) => match map.get("days") {
            Some(days) => DateRange::last_days(day_count(days)?, now),
            None => explicit_bounds(map),
        },
        Value::Number(_) | Value::String(_) => DateRange::last_days(day_count(value)?, now),
        _ => None,
    }
}

fn day_count(value: &Value) -> Option<i64> {
    let days = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !days.is_finite() || days <= 0.0 || days > i64::MAX as f64 {
        return None;
    }
    Some(days.round() as i64)
}

fn explicit_bounds(map: &Map<String, Value>) -> Option<DateRange> {
    let bound = |key: &str| map.get(key).and_then(Value::as_str).and_then(parse_timestamp);
    let range = DateRange {
        gte: bound("gte"),
        lte: bound("lte"),
        gt: bound("gt"),
        lt: bound("lt"),
    };
    (!range.is_unbounded()).then_some(range)
}
