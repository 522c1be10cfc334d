//! Optional ML tagger extension point.
//!
//! No ML crate is grounded anywhere in the retrieval pack, so no
//! concrete tagger ships here. The trait exists so the orchestrator can
//! treat "ML detector present" and "ML detector absent" uniformly: the
//! rest of the pipeline must not care which case it is in.

use crate::span::Span;

/// A token-tagging model mapping text to entity spans. Implementations
/// are expected to lazily initialize any model weights on first use.
pub trait MlTagger: Send + Sync {
    fn tag(&self, text: &str) -> Vec<Span>;
}

/// No detector installed; always returns an empty span list. This is
/// the orchestrator's default and satisfies the "absence must not break
/// the pipeline" contract by construction.
pub struct NoopTagger;

impl MlTagger for NoopTagger {
    fn tag(&self, _text: &str) -> Vec<Span> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_tagger_never_produces_spans() {
        assert!(NoopTagger.tag("SSN: 123-45-6789").is_empty());
    }
}
