//! Exposure-side scoring inputs, supplied by the caller.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Exposure {
    Private,
    Internal,
    OverExposed,
    Public,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encryption {
    None,
    Platform,
    CustomerManaged,
}

/// All exposure-side inputs to the scorer. Every field is required at
/// scoring time -- defaults, where they exist at all, live at the call
/// site as explicit policy, never as an implicit fallback inside the
/// scorer itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedContext {
    pub exposure: Exposure,
    pub encryption: Encryption,
    pub access_logging: bool,
    pub versioning: bool,
    pub staleness_days: u32,
    pub cross_account: bool,
    pub has_classification: bool,
    pub classification_source: String,
}

impl NormalizedContext {
    pub fn new(exposure: Exposure, encryption: Encryption) -> Self {
        NormalizedContext {
            exposure,
            encryption,
            access_logging: false,
            versioning: false,
            staleness_days: 0,
            cross_account: false,
            has_classification: false,
            classification_source: String::new(),
        }
    }
}
