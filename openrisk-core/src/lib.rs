//! Detection and risk-scoring engine for sensitive data (PII/PHI/credentials).
//!
//! This crate implements the pull-oriented, batch-and-request core described
//! by the workspace: a bounded-concurrency detector orchestrator, a
//! deterministic risk scorer, a durable label index, and a scan-trigger
//! policy. It performs no network I/O and produces no redacted output --
//! it classifies and scores, nothing more.
//!
//! Leaves-first module order: [`registry`] and [`span`]/[`label`] have no
//! internal dependencies; [`detectors`] builds on those; [`orchestrator`]
//! composes the detector set; [`scoring`] consumes its output alongside
//! caller-supplied [`context`]; [`index`] persists scorer results;
//! [`trigger`] reads the index and context to decide whether to scan again.

pub mod codec;
pub mod context;
pub mod context_filter;
pub mod detectors;
pub mod error;
pub mod events;
pub mod hashing;
pub mod index;
pub mod label;
pub mod normalize;
pub mod orchestrator;
pub mod registry;
pub mod scoring;
pub mod span;
pub mod trigger;

pub use context::{Encryption, Exposure, NormalizedContext};
pub use error::{OpenRiskError, Result};
pub use events::ScanEvent;
pub use label::{FileRef, Label, LabelSet};
pub use orchestrator::{DetectResult, EngineConfig, Orchestrator, StructuredKind};
pub use scoring::{score, ScoringResult, Tier, WireOptions};
pub use span::{DetectorTier, Span};
pub use trigger::ScanTrigger;
