pub mod catalogue;
pub mod checksum;
pub mod ml;
pub mod pattern;
pub mod structured;

use crate::span::Span;

/// A detector is a pure function from normalized text to spans,
/// independent of any particular implementation strategy.
pub trait Detector: Send + Sync {
    fn name(&self) -> &'static str;
    fn tier(&self) -> crate::span::DetectorTier;
    fn detect(&self, text: &str) -> Vec<Span>;
}

pub struct PatternDetector;
impl Detector for PatternDetector {
    fn name(&self) -> &'static str {
        "pattern"
    }
    fn tier(&self) -> crate::span::DetectorTier {
        crate::span::DetectorTier::Pattern
    }
    fn detect(&self, text: &str) -> Vec<Span> {
        pattern::detect(text)
    }
}

pub struct ChecksumDetector;
impl Detector for ChecksumDetector {
    fn name(&self) -> &'static str {
        "checksum"
    }
    fn tier(&self) -> crate::span::DetectorTier {
        crate::span::DetectorTier::Checksum
    }
    fn detect(&self, text: &str) -> Vec<Span> {
        checksum::detect(text)
    }
}
