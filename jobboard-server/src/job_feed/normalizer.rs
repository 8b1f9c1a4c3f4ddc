use super::client::RawJobRecord;
use crate::job_store::JobPosting;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use thiserror::Error;

pub const MAX_DESCRIPTION_CHARS: usize = 5000;

const DEFAULT_TITLE: &str = "No Title";
const DEFAULT_DESCRIPTION: &str = "No description";
const DEFAULT_LOCATION: &str = "Unknown";
const DEFAULT_EMPLOYMENT_TYPE: &str = "full_time";
const DEFAULT_COMPANY: &str = "Unknown Company";

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("malformed timestamp: {value:?}")]
    MalformedTimestamp { value: String },

    #[error("missing timestamp")]
    MissingTimestamp,
}

/// Maps one raw feed record onto a [`JobPosting`], filling placeholders for
/// anything missing. Fails only when the posting timestamp is absent or
/// cannot be parsed.
pub fn normalize_record(record: &RawJobRecord) -> Result<JobPosting, NormalizeError> {
    let posted_at = match non_empty_text(record.field("created")) {
        Some(raw) => parse_timestamp(&raw)?,
        None => return Err(NormalizeError::MissingTimestamp),
    };

    let description = match non_empty_text(record.field("description")) {
        Some(text) => truncate_chars(&text, MAX_DESCRIPTION_CHARS),
        None => DEFAULT_DESCRIPTION.to_string(),
    };

    Ok(JobPosting {
        title: text_or(record.field("title"), DEFAULT_TITLE),
        description,
        location: text_or(
            record.nested_field("location", "display_name"),
            DEFAULT_LOCATION,
        ),
        employment_type: text_or(record.field("contract_time"), DEFAULT_EMPLOYMENT_TYPE),
        company: text_or(
            record.nested_field("company", "display_name"),
            DEFAULT_COMPANY,
        ),
        source_url: text_or(record.field("redirect_url"), ""),
        salary: salary(record),
        posted_at,
    })
}

/// `salary_max` if present and non-zero, else `salary_min` under the same
/// rule, else 0.
fn salary(record: &RawJobRecord) -> i64 {
    let pick = |name: &str| numeric(record.field(name)).filter(|v| *v != 0.0);
    let value = pick("salary_max").or_else(|| pick("salary_min")).unwrap_or(0.0);
    if value.is_finite() && value > 0.0 {
        value.trunc() as i64
    } else {
        0
    }
}

fn numeric(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Strings are taken as-is, other scalars are stringified. Null, empty
/// strings, arrays and objects count as absent.
fn non_empty_text(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn text_or(value: Option<&Value>, default: &str) -> String {
    non_empty_text(value).unwrap_or_else(|| default.to_string())
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

/// Parses an ISO-8601 timestamp into naive UTC. Offset-bearing values are
/// converted to UTC, naive values are taken as UTC already.
fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, NormalizeError> {
    let value = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.naive_utc());
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Ok(dt.naive_utc());
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt);
        }
    }
    if let Some(midnight) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight);
    }

    Err(NormalizeError::MalformedTimestamp {
        value: raw.to_string(),
    })
}
