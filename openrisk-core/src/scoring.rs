//! Risk Scorer: a deterministic, explainable numeric model.
//!
//! `score()` is a pure function -- no I/O, no hidden state. Given the
//! same `LabelSet` and `NormalizedContext` it always returns the same
//! `ScoringResult` (property P1).

use crate::context::{Encryption, Exposure, NormalizedContext};
use crate::label::{Label, LabelSet};
use crate::registry;
use crate::trigger::ScanTrigger;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    Critical,
    High,
    Medium,
    Low,
    Minimal,
}

impl Tier {
    /// Total, one-to-one-by-threshold mapping from an integer score to a
    /// risk tier (property P3).
    pub fn from_score(score: i64) -> Tier {
        match score {
            86..=i64::MAX => Tier::Critical,
            61..=85 => Tier::High,
            31..=60 => Tier::Medium,
            11..=30 => Tier::Low,
            _ => Tier::Minimal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Critical => "CRITICAL",
            Tier::High => "HIGH",
            Tier::Medium => "MEDIUM",
            Tier::Low => "LOW",
            Tier::Minimal => "MINIMAL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    pub score: i64,
    pub tier: Tier,
    pub content_score: f64,
    pub exposure_multiplier: f64,
    pub co_occurrence_rules: Vec<String>,
    pub entities: Vec<Label>,
    pub context: NormalizedContext,
    pub triggers: Vec<ScanTrigger>,
}

impl ScoringResult {
    /// Attaches the trigger set that motivated this scan. The trigger
    /// policy runs against the *pre-scan* label state, before this
    /// scoring result exists, so it is recorded separately after the
    /// fact rather than computed inside `score()`.
    pub fn with_triggers(mut self, triggers: Vec<ScanTrigger>) -> Self {
        self.triggers = triggers;
        self
    }

    /// Builds the external scoring-result JSON document described in the
    /// external-interfaces contract (`version`, `content_hash`,
    /// `factors`, `scoring`, `provenance`), distinct from this struct's
    /// own `Serialize` derive, which is this crate's internal
    /// representation (used by the label index, for instance). Readers
    /// of the wire document must ignore unknown fields; this crate only
    /// ever writes the documented ones.
    pub fn to_wire(&self, opts: WireOptions<'_>) -> serde_json::Value {
        let raw_score = self.content_score * self.exposure_multiplier;
        serde_json::json!({
            "version": "1.0",
            "score": self.score,
            "tier": self.tier.as_str(),
            "content_hash": format!("sha256:{}", crate::hashing::sha256_hex(opts.content.as_bytes())),
            "content_length": opts.content.len(),
            "factors": {
                "entities": self.entities,
                "exposure": self.context.exposure,
                "exposure_multiplier": self.exposure_multiplier,
                "co_occurrence_rules": self.co_occurrence_rules,
                "raw_score": raw_score,
                "filtered": opts.filtered,
            },
            "context": {
                "encryption": self.context.encryption,
                "versioning": self.context.versioning,
                "access_logging": self.context.access_logging,
                "staleness_days": self.context.staleness_days,
                "classification_source": self.context.classification_source,
            },
            "scoring": {
                "algorithm": opts.algorithm,
                "confidence_threshold": opts.confidence_threshold,
                "mode": opts.mode,
            },
            "provenance": {
                "generator": opts.generator,
                "generated_at": opts.generated_at,
            },
        })
    }
}

/// Caller-supplied fields the scorer itself has no way to know (the
/// scanned content, the detector confidence floor in effect, which
/// generator produced this result) -- kept out of `ScoringResult`
/// proper so `score()` stays a pure function of `(labels, context)`.
pub struct WireOptions<'a> {
    pub content: &'a str,
    pub filtered: Vec<String>,
    pub algorithm: &'a str,
    pub confidence_threshold: f64,
    pub mode: &'a str,
    pub generator: &'a str,
    pub generated_at: i64,
}

struct CoOccurrenceRule {
    name: &'static str,
    mult: f64,
    fires: fn(&LabelSet) -> bool,
}

static RULES: Lazy<Vec<CoOccurrenceRule>> = Lazy::new(|| {
    vec![
        CoOccurrenceRule { name: "hipaa_phi", mult: 2.0, fires: |ls| has_category(ls, "direct_identifier") && has_category(ls, "health") },
        CoOccurrenceRule { name: "identity_theft", mult: 1.8, fires: |ls| has_category(ls, "direct_identifier") && has_category(ls, "financial") },
        CoOccurrenceRule { name: "credential_exposure", mult: 2.0, fires: |ls| has_category(ls, "credential") && has_any_pii(ls) },
        CoOccurrenceRule { name: "reidentification", mult: 1.5, fires: |ls| distinct_quasi_identifiers(ls) >= 3 },
        CoOccurrenceRule { name: "bulk_quasi_id", mult: 1.7, fires: |ls| distinct_quasi_identifiers(ls) >= 4 },
        CoOccurrenceRule { name: "classified", mult: 2.5, fires: |ls| has_category(ls, "classification") },
        CoOccurrenceRule { name: "biometric_pii", mult: 2.2, fires: |ls| has_category(ls, "biometric") && has_category(ls, "direct_identifier") },
        CoOccurrenceRule { name: "genetic", mult: 2.0, fires: |ls| has_category(ls, "genetic") },
    ]
});

fn has_category(labels: &LabelSet, prefix: &str) -> bool {
    labels.labels.iter().any(|l| registry::category(&l.entity_type).starts_with(prefix))
}

fn has_any_pii(labels: &LabelSet) -> bool {
    labels.labels.iter().any(|l| {
        let cat = registry::category(&l.entity_type);
        cat.starts_with("direct_identifier") || cat.starts_with("quasi_identifier") || cat.starts_with("health")
    })
}

fn distinct_quasi_identifiers(labels: &LabelSet) -> usize {
    labels
        .labels
        .iter()
        .filter(|l| registry::category(&l.entity_type).starts_with("quasi_identifier"))
        .count()
}

fn exposure_base(exposure: Exposure) -> f64 {
    match exposure {
        Exposure::Private => 1.0,
        Exposure::Internal => 1.2,
        Exposure::OverExposed => 1.8,
        Exposure::Public => 2.5,
    }
}

fn exposure_multiplier(context: &NormalizedContext) -> f64 {
    let mut mult = exposure_base(context.exposure);
    if context.encryption == Encryption::None {
        mult *= 1.3;
    }
    if !context.access_logging {
        mult *= 1.1;
    }
    if context.staleness_days > 365 {
        mult *= 1.2;
    }
    if context.cross_account {
        mult *= 1.3;
    }
    mult
}

/// Per-entity contribution: `weight * (1 + ln(max(count,1))) * confidence_avg`.
fn label_contribution(label: &Label) -> f64 {
    let weight = registry::weight(&label.entity_type) as f64;
    let count = label.count.max(1) as f64;
    weight * (1.0 + count.ln()) * label.confidence_avg
}

/// Runs the normative scoring algorithm from the risk-scorer contract:
/// per-entity contribution -> content score -> co-occurrence multiplier
/// -> exposure multiplier -> clamp to [0,100] -> tier.
pub fn score(labels: &LabelSet, context: &NormalizedContext) -> ScoringResult {
    let exposure_mult = exposure_multiplier(context);

    if labels.is_empty() {
        let mut base = match context.exposure {
            Exposure::Public => 15,
            Exposure::OverExposed => 10,
            _ => 0,
        };
        if context.encryption == Encryption::None {
            base += 5;
        }
        let score = base.min(100);
        return ScoringResult {
            score,
            tier: Tier::from_score(score),
            content_score: 0.0,
            exposure_multiplier: exposure_mult,
            co_occurrence_rules: Vec::new(),
            entities: Vec::new(),
            context: context.clone(),
            triggers: Vec::new(),
        };
    }

    let content_score: f64 = labels.labels.iter().map(label_contribution).sum();

    let mut fired: Vec<&'static str> = Vec::new();
    let mut max_mult = 1.0_f64;
    for rule in RULES.iter() {
        if (rule.fires)(labels) {
            fired.push(rule.name);
            if rule.mult > max_mult {
                max_mult = rule.mult;
            }
        }
    }
    let content_prime = content_score * max_mult;

    let raw_score = (content_prime * exposure_mult).floor() as i64;
    let final_score = raw_score.clamp(0, 100);

    ScoringResult {
        score: final_score,
        tier: Tier::from_score(final_score),
        content_score: content_prime,
        exposure_multiplier: exposure_mult,
        co_occurrence_rules: fired.into_iter().map(String::from).collect(),
        entities: labels.labels.clone(),
        context: context.clone(),
        triggers: Vec::new(),
    }
}
