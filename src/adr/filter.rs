use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use super::types::FilterCriteria;

/// Decide whether a record's front matter satisfies `criteria`.
///
/// Empty criteria accept everything, including records without metadata.
/// Otherwise every active predicate must hold:
///
/// - `status` / `impact`: the field is one of the accepted values
/// - `committed_after`: `committed-on` parses and is not earlier than the cutoff
/// - `decide_before`: status is `open` and `decide-by` parses and is earlier
///   than the cutoff
/// - `tags`: the record's `tags` list shares at least one entry with the criteria
pub fn matches(metadata: Option<&Value>, criteria: &FilterCriteria) -> bool {
    if criteria.is_empty() {
        return true;
    }

    let Some(metadata) = metadata.filter(|m| !m.is_null()) else {
        return false;
    };

    if let Some(accepted) = &criteria.status {
        if !contains(accepted, metadata.get("status")) {
            return false;
        }
    }

    if let Some(accepted) = &criteria.impact {
        if !contains(accepted, metadata.get("impact")) {
            return false;
        }
    }

    if let Some(cutoff) = criteria.committed_after {
        match field_timestamp(metadata, "committed-on") {
            Some(committed) if committed >= cutoff => {}
            _ => return false,
        }
    }

    if let Some(cutoff) = criteria.decide_before {
        if metadata.get("status").and_then(Value::as_str) != Some("open") {
            return false;
        }
        match field_timestamp(metadata, "decide-by") {
            Some(decide_by) if decide_by < cutoff => {}
            _ => return false,
        }
    }

    if let Some(wanted) = &criteria.tags {
        let Some(tags) = metadata.get("tags").and_then(Value::as_array) else {
            return false;
        };
        let any = tags
            .iter()
            .filter_map(Value::as_str)
            .any(|tag| wanted.iter().any(|w| w == tag));
        if !any {
            return false;
        }
    }

    true
}

/// Naive date-time layouts, read as UTC.
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Parse an RFC 3339 timestamp, a naive `YYYY-MM-DDTHH:MM:SS` or
/// `YYYY-MM-DD HH:MM:SS` (taken as UTC) or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
    {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn contains(accepted: &[String], value: Option<&Value>) -> bool {
    match value.and_then(Value::as_str) {
        Some(value) => accepted.iter().any(|a| a == value),
        None => false,
    }
}

fn field_timestamp(metadata: &Value, key: &str) -> Option<DateTime<Utc>> {
    metadata.get(key).and_then(Value::as_str).and_then(parse_timestamp)
}
