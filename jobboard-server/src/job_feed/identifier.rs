use serde_json::Value;
use uuid::Uuid;

/// Derives the stable local id of an external record.
///
/// An id that already is a UUID is kept as-is. Anything else is hashed into a
/// name-based UUID under the DNS namespace, so the same external id always
/// maps to the same row. Numbers are stringified and a missing id hashes the
/// empty string.
pub fn resolve_job_id(external_id: Option<&Value>) -> Uuid {
    let text = match external_id {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    Uuid::parse_str(&text).unwrap_or_else(|_| Uuid::new_v5(&Uuid::NAMESPACE_DNS, text.as_bytes()))
}
