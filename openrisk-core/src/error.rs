use thiserror::Error;

/// Stable, project-prefixed error taxonomy for the detection and scoring engine.
///
/// Every variant carries a machine-parseable code (`OPRISK-xxxx`) and a
/// retryability classification so callers can build sane retry policy
/// without string-matching on messages.
#[derive(Debug, Error)]
pub enum OpenRiskError {
    #[error("input exceeds maximum size ({size} > {limit} bytes)")]
    InputTooLarge { size: usize, limit: usize },

    #[error("input failed schema validation: {0}")]
    InputInvalid(String),

    #[error("detector run exceeded its deadline")]
    Timeout,

    #[error("operation cancelled before completion")]
    Cancelled,

    #[error("label index database error: {0}")]
    DatabaseError(String),

    #[error("label index schema version mismatch: found {found}, expected {expected}")]
    SchemaMismatch { found: i64, expected: i64 },

    #[error("label index is closed")]
    Closed,

    #[error("malformed trailer or sidecar payload: {0}")]
    CodecError(String),
}

impl OpenRiskError {
    /// Stable machine-parseable code for this error, e.g. `"OPRISK-1001"`.
    pub fn code(&self) -> &'static str {
        match self {
            OpenRiskError::InputTooLarge { .. } => "OPRISK-1001",
            OpenRiskError::InputInvalid(_) => "OPRISK-1002",
            OpenRiskError::Timeout => "OPRISK-1003",
            OpenRiskError::Cancelled => "OPRISK-1004",
            OpenRiskError::DatabaseError(_) => "OPRISK-2001",
            OpenRiskError::SchemaMismatch { .. } => "OPRISK-2002",
            OpenRiskError::Closed => "OPRISK-2003",
            OpenRiskError::CodecError(_) => "OPRISK-3001",
        }
    }

    /// Whether a caller may reasonably retry the operation that produced
    /// this error. Permanent/structural errors (bad schema, closed handle,
    /// oversized input) are never retryable; transient resource errors are.
    pub fn is_retryable(&self) -> bool {
        matches!(self, OpenRiskError::DatabaseError(_) | OpenRiskError::Timeout)
    }
}

impl From<rusqlite::Error> for OpenRiskError {
    fn from(err: rusqlite::Error) -> Self {
        OpenRiskError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for OpenRiskError {
    fn from(err: serde_json::Error) -> Self {
        OpenRiskError::InputInvalid(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OpenRiskError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn all_variants() -> Vec<OpenRiskError> {
        vec![
            OpenRiskError::InputTooLarge { size: 10, limit: 5 },
            OpenRiskError::InputInvalid("x".into()),
            OpenRiskError::Timeout,
            OpenRiskError::Cancelled,
            OpenRiskError::DatabaseError("x".into()),
            OpenRiskError::SchemaMismatch { found: 1, expected: 2 },
            OpenRiskError::Closed,
            OpenRiskError::CodecError("x".into()),
        ]
    }

    #[test]
    fn codes_are_unique_and_prefixed() {
        let variants = all_variants();
        let codes: Vec<&str> = variants.iter().map(|e| e.code()).collect();
        let mut unique = codes.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), codes.len(), "duplicate error codes");
        for code in &codes {
            assert!(code.starts_with("OPRISK-"), "code {code} missing prefix");
        }
    }

    #[test]
    fn retryability_matches_transience() {
        assert!(OpenRiskError::Timeout.is_retryable());
        assert!(OpenRiskError::DatabaseError("x".into()).is_retryable());
        assert!(!OpenRiskError::Closed.is_retryable());
        assert!(!OpenRiskError::SchemaMismatch { found: 1, expected: 2 }.is_retryable());
        assert!(!OpenRiskError::InputTooLarge { size: 1, limit: 0 }.is_retryable());
    }
}
