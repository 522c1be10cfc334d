//! Scan Trigger Policy: pure decision of whether a (re)scan is warranted.

use crate::context::{Encryption, Exposure, NormalizedContext};
use crate::label::LabelSet;
use crate::registry;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanTrigger {
    NoLabels,
    PublicAccess,
    OverExposed,
    NoEncryption,
    StaleData,
    LowConfidenceHighRisk,
}

/// Default weight threshold above which a label counts as "high risk"
/// for the `LowConfidenceHighRisk` trigger.
pub const HIGH_RISK_WEIGHT: u8 = 8;
/// Default confidence threshold below which a high-risk label is
/// considered under-confident enough to warrant a rescan.
pub const RESCAN_CONFIDENCE: f64 = 0.80;

/// Evaluates whether a scan should run given the existing label state
/// and exposure context, and which named triggers fired. Pure function:
/// no I/O, callable any number of times with identical results for
/// identical inputs.
pub fn evaluate(existing_labels: &LabelSet, context: &NormalizedContext) -> (bool, Vec<ScanTrigger>) {
    let mut triggers = Vec::new();

    if existing_labels.is_empty() || !context.has_classification {
        triggers.push(ScanTrigger::NoLabels);
    }
    if context.exposure == Exposure::Public {
        triggers.push(ScanTrigger::PublicAccess);
    }
    if context.exposure == Exposure::OverExposed {
        triggers.push(ScanTrigger::OverExposed);
    }
    if context.encryption == Encryption::None {
        triggers.push(ScanTrigger::NoEncryption);
    }
    if context.staleness_days > 365 {
        triggers.push(ScanTrigger::StaleData);
    }
    let low_confidence_high_risk = existing_labels.labels.iter().any(|l| {
        registry::weight(&l.entity_type) >= HIGH_RISK_WEIGHT && l.confidence_avg < RESCAN_CONFIDENCE
    });
    if low_confidence_high_risk {
        triggers.push(ScanTrigger::LowConfidenceHighRisk);
    }

    (!triggers.is_empty(), triggers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::Label;

    #[test]
    fn empty_labels_public_bucket_fires_three_triggers() {
        let labels = LabelSet::new("gen:0.1", 0);
        let mut context = NormalizedContext::new(Exposure::Public, Encryption::None);
        context.has_classification = false;
        let (should_scan, triggers) = evaluate(&labels, &context);
        assert!(should_scan);
        assert!(triggers.contains(&ScanTrigger::NoLabels));
        assert!(triggers.contains(&ScanTrigger::PublicAccess));
        assert!(triggers.contains(&ScanTrigger::NoEncryption));
    }

    #[test]
    fn fully_labeled_private_encrypted_fresh_data_does_not_scan() {
        let mut labels = LabelSet::new("gen:0.1", 0);
        labels.insert(Label { entity_type: "EMAIL".into(), count: 1, confidence_avg: 0.9, detector_kind: "pattern".into(), value_hash: "a1b2c3".into() });
        let mut context = NormalizedContext::new(Exposure::Private, Encryption::Platform);
        context.access_logging = true;
        context.has_classification = true;
        let (should_scan, triggers) = evaluate(&labels, &context);
        assert!(!should_scan);
        assert!(triggers.is_empty());
    }

    #[test]
    fn low_confidence_high_risk_label_forces_rescan() {
        let mut labels = LabelSet::new("gen:0.1", 0);
        labels.insert(Label { entity_type: "CREDIT_CARD".into(), count: 1, confidence_avg: 0.5, detector_kind: "pattern".into(), value_hash: "a1b2c3".into() });
        let mut context = NormalizedContext::new(Exposure::Private, Encryption::Platform);
        context.has_classification = true;
        let (should_scan, triggers) = evaluate(&labels, &context);
        assert!(should_scan);
        assert!(triggers.contains(&ScanTrigger::LowConfidenceHighRisk));
    }
}
