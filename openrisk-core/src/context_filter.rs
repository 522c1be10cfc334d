//! Post-merge span filters: clinical-context suppression and the
//! carrier tracking-number filter.

use crate::detectors::checksum;
use crate::span::Span;

/// Negative-context markers: a span whose immediate surroundings match
/// one of these is almost certainly not real PHI/PII (source code,
/// URLs, doc comments) and is suppressed. Declarative by design so new
/// rules don't require touching detector code.
const NEGATIVE_CONTEXT_MARKERS: &[&str] = &["//", "#", "/*", "http://", "https://", "SPDX-License-Identifier"];

/// Suppresses spans that only occur in clearly-non-PHI contexts, such
/// as source comments or URL paths, by inspecting a small window of
/// text immediately preceding the span.
pub fn clinical_context_filter(text: &str, spans: Vec<Span>) -> Vec<Span> {
    spans
        .into_iter()
        .filter(|span| {
            let window_start = span.start.saturating_sub(32);
            let window = text.get(window_start..span.start).unwrap_or("");
            !NEGATIVE_CONTEXT_MARKERS.iter().any(|marker| window.contains(marker))
        })
        .collect()
}

/// Suppresses digit runs that validate as carrier tracking numbers
/// (UPS/USPS/FedEx) unless removing them would strip a span that *also*
/// independently validates via its own checksum detector (e.g. a
/// genuine SSN that happens to share a tracking number's length class)
/// -- in that case the higher-tier, independently-validated detection
/// wins and the tracking-number candidate is simply not added in the
/// first place by the pattern layer, so this filter only needs to drop
/// spans explicitly tagged as tracking-number candidates that fail the
/// checksum.
pub fn tracking_number_filter(text: &str, spans: Vec<Span>) -> Vec<Span> {
    spans
        .into_iter()
        .filter(|span| {
            if span.entity_type != "TRACKING_NUMBER" {
                return true;
            }
            let candidate = text.get(span.start..span.end).unwrap_or("");
            checksum::validate_tracking_number(candidate) > 0.0
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::DetectorTier;

    fn span(entity: &str, start: usize, end: usize) -> Span {
        Span::new(entity, start, end, 0.8, DetectorTier::Pattern, "test", "h").unwrap()
    }

    #[test]
    fn suppresses_span_following_comment_marker() {
        let text = "// SSN: 123-45-6789 example in code";
        let spans = vec![span("SSN", 8, 19)];
        let filtered = clinical_context_filter(text, spans);
        assert!(filtered.is_empty());
    }

    #[test]
    fn keeps_span_without_negative_context() {
        let text = "Patient SSN: 123-45-6789 on file";
        let spans = vec![span("SSN", 13, 24)];
        let filtered = clinical_context_filter(text, spans);
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn drops_tracking_number_candidate_failing_checksum() {
        let text = "id 000000000000000000 end";
        let spans = vec![span("TRACKING_NUMBER", 3, 21)];
        let filtered = tracking_number_filter(text, spans);
        assert!(filtered.is_empty());
    }
}
