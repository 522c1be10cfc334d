//! Span: a single raw detection produced by a detector.

use serde::{Deserialize, Serialize};

/// Detector reliability class. Lower numeric value wins ties during
/// span merging; checksum-validated detections are the most trustworthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum DetectorTier {
    Checksum = 1,
    Pattern = 2,
    Ml = 3,
    Dictionary = 4,
}

impl DetectorTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorTier::Checksum => "checksum",
            DetectorTier::Pattern => "pattern",
            DetectorTier::Ml => "ml",
            DetectorTier::Dictionary => "dictionary",
        }
    }
}

/// A single detection: an entity type found at a byte range in text.
///
/// Invariant: `0 <= start < end <= text.len()`. Constructed only via
/// [`Span::new`], which enforces this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub entity_type: String,
    pub start: usize,
    pub end: usize,
    pub confidence: f64,
    pub detector_tier: DetectorTier,
    pub source_detector: String,
    pub raw_value_hash: String,
}

impl Span {
    /// Builds a span, normalizing the entity type and clamping confidence
    /// into `[0, 1]`. Returns `None` if the byte range is empty or inverted
    /// -- callers must never construct a span violating the core invariant.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        entity_type: impl Into<String>,
        start: usize,
        end: usize,
        confidence: f64,
        detector_tier: DetectorTier,
        source_detector: impl Into<String>,
        raw_value_hash: impl Into<String>,
    ) -> Option<Self> {
        if start >= end {
            return None;
        }
        Some(Span {
            entity_type: crate::registry::normalize(&entity_type.into()),
            start,
            end,
            confidence: confidence.clamp(0.0, 1.0),
            detector_tier,
            source_detector: source_detector.into(),
            raw_value_hash: raw_value_hash.into(),
        })
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Sorts spans by `(start, entity_type, detector_tier)` for stable,
/// reproducible output as required by the orchestrator's ordering
/// guarantee.
pub fn sort_stable(spans: &mut [Span]) {
    spans.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| a.entity_type.cmp(&b.entity_type))
            .then_with(|| a.detector_tier.cmp(&b.detector_tier))
    });
}

/// Sort-and-sweep overlap merge: for overlapping spans, lower
/// `detector_tier` wins; ties break by higher confidence, then earlier
/// start, then longer length. Exact duplicates collapse. Runs in
/// O(n log n) rather than the naive O(n^2) pairwise comparison.
pub fn merge_overlaps(mut spans: Vec<Span>) -> Vec<Span> {
    if spans.len() <= 1 {
        return spans;
    }
    spans.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.end.cmp(&b.end)));

    let mut result: Vec<Span> = Vec::with_capacity(spans.len());
    'outer: for span in spans {
        for kept in result.iter_mut() {
            if kept.overlaps(&span) && kept.entity_type == span.entity_type {
                if better(&span, kept) {
                    *kept = span;
                }
                continue 'outer;
            }
        }
        result.push(span);
    }
    sort_stable(&mut result);
    result
}

fn better(candidate: &Span, incumbent: &Span) -> bool {
    use std::cmp::Ordering;
    match candidate.detector_tier.cmp(&incumbent.detector_tier) {
        Ordering::Less => true,
        Ordering::Greater => false,
        Ordering::Equal => match candidate
            .confidence
            .partial_cmp(&incumbent.confidence)
            .unwrap_or(Ordering::Equal)
        {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => match candidate.start.cmp(&incumbent.start) {
                Ordering::Less => true,
                Ordering::Greater => false,
                Ordering::Equal => candidate.len() > incumbent.len(),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(entity: &str, start: usize, end: usize, conf: f64, tier: DetectorTier) -> Span {
        Span::new(entity, start, end, conf, tier, "test", "hash").unwrap()
    }

    #[test]
    fn rejects_inverted_range() {
        assert!(Span::new("SSN", 5, 5, 0.9, DetectorTier::Checksum, "x", "h").is_none());
        assert!(Span::new("SSN", 5, 2, 0.9, DetectorTier::Checksum, "x", "h").is_none());
    }

    #[test]
    fn clamps_confidence() {
        let s = Span::new("SSN", 0, 3, 1.5, DetectorTier::Checksum, "x", "h").unwrap();
        assert_eq!(s.confidence, 1.0);
    }

    #[test]
    fn merge_prefers_lower_tier() {
        let spans = vec![
            span("SSN", 0, 11, 0.6, DetectorTier::Pattern),
            span("SSN", 0, 11, 0.95, DetectorTier::Checksum),
        ];
        let merged = merge_overlaps(spans);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].detector_tier, DetectorTier::Checksum);
    }

    #[test]
    fn merge_keeps_disjoint_spans() {
        let spans = vec![
            span("SSN", 0, 11, 0.9, DetectorTier::Checksum),
            span("EMAIL", 20, 35, 0.8, DetectorTier::Pattern),
        ];
        let merged = merge_overlaps(spans);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn merge_does_not_collapse_different_entity_types() {
        let spans = vec![
            span("SSN", 0, 11, 0.9, DetectorTier::Checksum),
            span("MRN", 0, 11, 0.7, DetectorTier::Pattern),
        ];
        let merged = merge_overlaps(spans);
        assert_eq!(merged.len(), 2);
    }
}
