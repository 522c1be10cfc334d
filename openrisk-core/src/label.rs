//! Label and LabelSet: per-file aggregation of spans.

use crate::span::Span;
use serde::{Deserialize, Serialize};

/// A Span aggregated to a file: all spans of one entity type collapse
/// into a single label carrying a count and an averaged confidence.
fn one() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    #[serde(rename = "t")]
    pub entity_type: String,
    #[serde(rename = "n", default = "one")]
    pub count: u32,
    #[serde(rename = "c")]
    pub confidence_avg: f64,
    #[serde(rename = "d")]
    pub detector_kind: String,
    #[serde(rename = "h")]
    pub value_hash: String,
}

/// `{ version, labels, source, generated_at, file_ref? }`, compact JSON
/// field names (`v`, `labels`, `src`, `ts`, `file`) per the trailer/sidecar
/// wire format in the external-interfaces contract. Entity-type uniqueness
/// within a set is an invariant: inserting a span for an entity type
/// already present aggregates into the existing label rather than creating
/// a duplicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelSet {
    #[serde(rename = "v")]
    pub version: u32,
    pub labels: Vec<Label>,
    #[serde(rename = "src")]
    pub source: String,
    #[serde(rename = "ts")]
    pub generated_at: i64,
    #[serde(rename = "file", skip_serializing_if = "Option::is_none", default)]
    pub file_ref: Option<FileRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRef {
    pub name: String,
    pub size: u64,
    pub hash: String,
}

impl LabelSet {
    pub fn new(source: impl Into<String>, generated_at: i64) -> Self {
        LabelSet { version: 1, labels: Vec::new(), source: source.into(), generated_at, file_ref: None }
    }

    /// Builds a LabelSet by aggregating spans: each distinct entity type
    /// becomes one label with `count` = number of spans and
    /// `confidence_avg` = mean confidence across those spans.
    pub fn from_spans(spans: &[Span], source: impl Into<String>, generated_at: i64) -> Self {
        use std::collections::HashMap;
        let mut groups: HashMap<&str, (u32, f64, &str, &str)> = HashMap::new();
        for span in spans {
            let entry = groups.entry(span.entity_type.as_str()).or_insert((
                0,
                0.0,
                span.detector_tier.as_str(),
                span.raw_value_hash.as_str(),
            ));
            entry.0 += 1;
            entry.1 += span.confidence;
        }
        let mut labels: Vec<Label> = groups
            .into_iter()
            .map(|(entity_type, (count, conf_sum, detector_kind, value_hash))| Label {
                entity_type: entity_type.to_string(),
                count,
                confidence_avg: conf_sum / count as f64,
                detector_kind: detector_kind.to_string(),
                value_hash: value_hash.to_string(),
            })
            .collect();
        labels.sort_by(|a, b| a.entity_type.cmp(&b.entity_type));
        LabelSet { version: 1, labels, source: source.into(), generated_at, file_ref: None }
    }

    /// Inserts or merges a label, preserving entity-type uniqueness: an
    /// existing label for the same entity type has its count and average
    /// confidence updated rather than being duplicated.
    pub fn insert(&mut self, label: Label) {
        if let Some(existing) = self.labels.iter_mut().find(|l| l.entity_type == label.entity_type) {
            let total = existing.count + label.count;
            existing.confidence_avg = (existing.confidence_avg * existing.count as f64
                + label.confidence_avg * label.count as f64)
                / total as f64;
            existing.count = total;
        } else {
            self.labels.push(label);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::DetectorTier;

    fn span(entity: &str, conf: f64) -> Span {
        Span::new(entity, 0, 5, conf, DetectorTier::Checksum, "checksum", "abcdef").unwrap()
    }

    #[test]
    fn from_spans_aggregates_same_entity_type() {
        let spans = vec![span("SSN", 0.9), span("SSN", 0.8), span("EMAIL", 0.7)];
        let set = LabelSet::from_spans(&spans, "gen:0.1", 1_700_000_000);
        assert_eq!(set.labels.len(), 2);
        let ssn = set.labels.iter().find(|l| l.entity_type == "SSN").unwrap();
        assert_eq!(ssn.count, 2);
        assert!((ssn.confidence_avg - 0.85).abs() < 1e-9);
    }

    #[test]
    fn insert_merges_existing_entity_type() {
        let mut set = LabelSet::new("gen:0.1", 0);
        set.insert(Label { entity_type: "SSN".into(), count: 1, confidence_avg: 0.9, detector_kind: "checksum".into(), value_hash: "a1b2c3".into() });
        set.insert(Label { entity_type: "SSN".into(), count: 1, confidence_avg: 0.7, detector_kind: "checksum".into(), value_hash: "a1b2c3".into() });
        assert_eq!(set.labels.len(), 1);
        assert_eq!(set.labels[0].count, 2);
        assert!((set.labels[0].confidence_avg - 0.8).abs() < 1e-9);
    }
}
