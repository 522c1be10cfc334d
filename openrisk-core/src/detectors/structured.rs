//! Structured detectors: JSON and CSV field extraction by header name.
//!
//! Associates column/field names with an inferred entity type via a
//! small header-to-type table, then emits tier-1 spans for values under
//! an unambiguous header. XML is deliberately not implemented here: no
//! XML-parsing crate is grounded anywhere in the retrieval pack, and
//! introducing one would violate the "never fabricate dependencies"
//! constraint -- XML structured input degrades to the plain pattern
//! detector instead.

use crate::hashing::hash_value;
use crate::span::{DetectorTier, Span};
use once_cell::sync::Lazy;
use std::collections::HashMap;

static HEADER_TYPES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("ssn", "SSN");
    m.insert("social_security_number", "SSN");
    m.insert("email", "EMAIL");
    m.insert("email_address", "EMAIL");
    m.insert("phone", "PHONE");
    m.insert("phone_number", "PHONE");
    m.insert("credit_card", "CREDIT_CARD");
    m.insert("card_number", "CREDIT_CARD");
    m.insert("mrn", "MRN");
    m.insert("medical_record_number", "MRN");
    m.insert("diagnosis", "DIAGNOSIS");
    m.insert("dob", "DATE_DOB");
    m.insert("date_of_birth", "DATE_DOB");
    m.insert("zip", "ZIP_CODE");
    m.insert("zip_code", "ZIP_CODE");
    m
});

fn infer_type(header: &str) -> Option<&'static str> {
    HEADER_TYPES.get(header.trim().to_ascii_lowercase().as_str()).copied()
}

/// Extracts spans from CSV text whose header row names a known field.
/// Returns spans positioned at byte offsets into `text` as given.
pub fn detect_csv(text: &str) -> Vec<Span> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(text.as_bytes());
    let headers: Vec<String> = match reader.headers() {
        Ok(h) => h.iter().map(|s| s.to_string()).collect(),
        Err(_) => return Vec::new(),
    };
    let inferred: Vec<Option<&'static str>> = headers.iter().map(|h| infer_type(h)).collect();
    if inferred.iter().all(Option::is_none) {
        return Vec::new();
    }

    let mut spans = Vec::new();
    for result in reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(_) => continue,
        };
        for (i, field) in record.iter().enumerate() {
            if let Some(Some(entity_type)) = inferred.get(i) {
                if field.trim().is_empty() {
                    continue;
                }
                if let Some(range) = find_byte_range(text, field) {
                    if let Some(span) = Span::new(
                        *entity_type,
                        range.0,
                        range.1,
                        0.8,
                        DetectorTier::Checksum,
                        "structured_csv",
                        hash_value(entity_type, field),
                    ) {
                        spans.push(span);
                    }
                }
            }
        }
    }
    spans
}

/// Extracts spans from a flat or nested JSON document whose object keys
/// name a known field. Recurses into arrays and nested objects.
pub fn detect_json(text: &str) -> Vec<Span> {
    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(_) => return Vec::new(),
    };
    let mut spans = Vec::new();
    walk_json(&value, text, &mut spans);
    spans
}

fn walk_json(value: &serde_json::Value, text: &str, spans: &mut Vec<Span>) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, v) in map {
                if let Some(entity_type) = infer_type(key) {
                    if let serde_json::Value::String(s) = v {
                        if let Some(range) = find_byte_range(text, s) {
                            if let Some(span) = Span::new(
                                entity_type,
                                range.0,
                                range.1,
                                0.8,
                                DetectorTier::Checksum,
                                "structured_json",
                                hash_value(entity_type, s),
                            ) {
                                spans.push(span);
                            }
                        }
                    }
                }
                walk_json(v, text, spans);
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                walk_json(item, text, spans);
            }
        }
        _ => {}
    }
}

fn find_byte_range(haystack: &str, needle: &str) -> Option<(usize, usize)> {
    haystack.find(needle).map(|start| (start, start + needle.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_csv_column_by_header() {
        let csv_text = "name,ssn,email\nJane Doe,123456789,jane@example.com\n";
        let spans = detect_csv(csv_text);
        assert!(spans.iter().any(|s| s.entity_type == "SSN"));
        assert!(spans.iter().any(|s| s.entity_type == "EMAIL"));
    }

    #[test]
    fn csv_without_known_headers_yields_nothing() {
        let csv_text = "col_a,col_b\n1,2\n";
        assert!(detect_csv(csv_text).is_empty());
    }

    #[test]
    fn detects_json_field_by_key() {
        let json_text = r#"{"patient": {"ssn": "123456789", "diagnosis": "diabetes"}}"#;
        let spans = detect_json(json_text);
        assert!(spans.iter().any(|s| s.entity_type == "SSN"));
        assert!(spans.iter().any(|s| s.entity_type == "DIAGNOSIS"));
    }

    #[test]
    fn invalid_json_returns_empty_not_panic() {
        assert!(detect_json("not json at all").is_empty());
    }
}
