//! Entity registry: weights, category hierarchy, checksum/high-risk
//! flags, and alias folding, loaded from an embedded declarative YAML
//! catalogue -- the same parse-then-validate-then-load discipline the
//! pattern catalogue (`detectors/catalogue.rs`) uses.
//!
//! Loaded once at startup and never mutated afterward, so lookups
//! require no locking.

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::warn;

/// One entry in the entity registry.
#[derive(Debug, Clone, Copy)]
pub struct EntityDef {
    pub weight: u8,
    pub category: &'static str,
    pub checksum_validatable: bool,
    pub high_risk: bool,
}

const UNKNOWN_DEF: EntityDef = EntityDef {
    weight: 1,
    category: "unknown",
    checksum_validatable: false,
    high_risk: false,
};

#[derive(Debug, Deserialize)]
struct RawEntity {
    weight: u8,
    category: String,
    #[serde(default)]
    checksum_validatable: bool,
    #[serde(default)]
    high_risk: bool,
}

#[derive(Debug, Deserialize)]
struct RawRegistry {
    entities: std::collections::BTreeMap<String, RawEntity>,
    #[serde(default)]
    aliases: std::collections::BTreeMap<String, String>,
}

/// The embedded built-in registry catalogue: weights (1-10), dot-separated
/// category paths, and checksum/high-risk flags for every known entity
/// type, plus alias foldings onto canonical spellings.
const BUILTIN_REGISTRY_YAML: &str = r#"
entities:
  SSN:
    weight: 9
    category: direct_identifier.national_id
    checksum_validatable: true
    high_risk: true
  PASSPORT_NUMBER:
    weight: 8
    category: direct_identifier.national_id
    high_risk: true
  DRIVER_LICENSE:
    weight: 7
    category: direct_identifier.national_id
  FULL_NAME:
    weight: 4
    category: direct_identifier.name
  EMAIL:
    weight: 3
    category: direct_identifier.contact
  PHONE:
    weight: 3
    category: direct_identifier.contact
  DATE_DOB:
    weight: 5
    category: direct_identifier.dob
  CREDIT_CARD:
    weight: 9
    category: financial.card
    checksum_validatable: true
    high_risk: true
  IBAN:
    weight: 8
    category: financial.bank_account
    checksum_validatable: true
    high_risk: true
  ABA_ROUTING:
    weight: 7
    category: financial.bank_account
    checksum_validatable: true
  CUSIP:
    weight: 6
    category: financial.security
    checksum_validatable: true
  ISIN:
    weight: 6
    category: financial.security
    checksum_validatable: true
  MRN:
    weight: 8
    category: health.record_id
    high_risk: true
  DIAGNOSIS:
    weight: 7
    category: health.condition
    high_risk: true
  NPI:
    weight: 5
    category: health.provider_id
    checksum_validatable: true
  DEA_NUMBER:
    weight: 7
    category: health.provider_id
    checksum_validatable: true
    high_risk: true
  AWS_ACCESS_KEY:
    weight: 9
    category: credential.cloud
    high_risk: true
  AWS_SECRET_KEY:
    weight: 10
    category: credential.cloud
    high_risk: true
  GENERIC_API_KEY:
    weight: 8
    category: credential.api_key
    high_risk: true
  PRIVATE_KEY_BLOCK:
    weight: 10
    category: credential.key_material
    high_risk: true
  PASSWORD_IN_TEXT:
    weight: 8
    category: credential.password
    high_risk: true
  ZIP_CODE:
    weight: 2
    category: quasi_identifier.geography
  BIRTH_YEAR:
    weight: 2
    category: quasi_identifier.demographic
  GENDER:
    weight: 1
    category: quasi_identifier.demographic
  EMPLOYER:
    weight: 2
    category: quasi_identifier.affiliation
  FINGERPRINT_REF:
    weight: 9
    category: biometric.reference
    high_risk: true
  FACE_TEMPLATE:
    weight: 9
    category: biometric.reference
    high_risk: true
  GENETIC_MARKER:
    weight: 10
    category: genetic.marker
    high_risk: true
  CLASSIFICATION_MARKING:
    weight: 10
    category: classification.marker
    high_risk: true
  VIN:
    weight: 4
    category: other.vehicle
    checksum_validatable: true
  TRACKING_NUMBER:
    weight: 1
    category: other.logistics
    checksum_validatable: true
aliases:
  US_SSN: SSN
  SOCIAL_SECURITY_NUMBER: SSN
  DOB: DATE_DOB
  DATE_OF_BIRTH: DATE_DOB
  CC_NUMBER: CREDIT_CARD
  CREDIT_CARD_NUMBER: CREDIT_CARD
  ROUTING_NUMBER: ABA_ROUTING
  MEDICAL_RECORD_NUMBER: MRN
  EMAIL_ADDRESS: EMAIL
  PHONE_NUMBER: PHONE
"#;

static CATALOGUE: Lazy<(HashMap<String, EntityDef>, HashMap<String, String>)> =
    Lazy::new(|| load_registry(BUILTIN_REGISTRY_YAML).unwrap_or_default());

fn registry() -> &'static HashMap<String, EntityDef> {
    &CATALOGUE.0
}

fn aliases() -> &'static HashMap<String, String> {
    &CATALOGUE.1
}

/// Parses and schema-validates the registry catalogue. Malformed entries
/// at load time are permanent-but-local-recoverable per the error
/// taxonomy: the entry is skipped with a structured log, overall load
/// still succeeds. Category strings are interned with `Box::leak` once
/// at load time so lookups can keep returning `&'static str` without
/// re-allocating or threading a lifetime through every caller.
fn load_registry(yaml: &str) -> crate::error::Result<(HashMap<String, EntityDef>, HashMap<String, String>)> {
    let parsed: RawRegistry = serde_yaml::from_str(yaml).map_err(|e| crate::error::OpenRiskError::InputInvalid(e.to_string()))?;
    let mut entities = HashMap::new();
    for (name, raw) in parsed.entities {
        if raw.weight < 1 || raw.weight > 10 {
            warn!(entity = %name, weight = raw.weight, "skipping registry entry with out-of-range weight");
            continue;
        }
        if raw.category.trim().is_empty() {
            warn!(entity = %name, "skipping registry entry with empty category");
            continue;
        }
        let category: &'static str = Box::leak(raw.category.into_boxed_str());
        entities.insert(
            name,
            EntityDef { weight: raw.weight, category, checksum_validatable: raw.checksum_validatable, high_risk: raw.high_risk },
        );
    }
    Ok((entities, parsed.aliases))
}

/// Canonicalizes an entity type string: uppercases it and folds known
/// aliases onto their canonical spelling. This is the single place entity
/// type strings are normalized; nothing downstream should re-derive it.
pub fn normalize(entity_type: &str) -> String {
    let upper = entity_type.trim().to_ascii_uppercase();
    aliases().get(upper.as_str()).cloned().unwrap_or(upper)
}

/// Looks up the integer weight (1-10) for a canonical entity type.
/// Unknown types resolve to weight 1, never an error, for forward
/// compatibility across generator versions.
pub fn weight(entity_type: &str) -> u8 {
    def_for(entity_type).weight
}

/// Looks up the dot-separated category path for a canonical entity type.
pub fn category(entity_type: &str) -> &'static str {
    def_for(entity_type).category
}

/// Whether the registry recognizes this entity type at all (after alias
/// folding), as opposed to falling back to the `unknown` default.
pub fn contains(entity_type: &str) -> bool {
    registry().contains_key(normalize(entity_type).as_str())
}

pub fn is_checksum_validatable(entity_type: &str) -> bool {
    def_for(entity_type).checksum_validatable
}

pub fn is_high_risk(entity_type: &str) -> bool {
    def_for(entity_type).high_risk
}

/// Enumerates canonical entity types whose category path starts with
/// `prefix`, e.g. `enumerate_by_category("direct_identifier")`.
pub fn enumerate_by_category(prefix: &str) -> Vec<&'static str> {
    registry()
        .iter()
        .filter(|(_, def)| def.category.starts_with(prefix))
        .map(|(name, _)| name.as_str())
        .collect()
}

fn def_for(entity_type: &str) -> EntityDef {
    let canon = normalize(entity_type);
    registry().get(canon.as_str()).copied().unwrap_or(UNKNOWN_DEF)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_entity_falls_back_safely() {
        assert_eq!(weight("TOTALLY_MADE_UP"), 1);
        assert_eq!(category("TOTALLY_MADE_UP"), "unknown");
        assert!(!contains("TOTALLY_MADE_UP"));
    }

    #[test]
    fn aliases_fold_onto_canonical() {
        assert_eq!(normalize("us_ssn"), "SSN");
        assert_eq!(weight("US_SSN"), weight("SSN"));
        assert_eq!(normalize("dob"), "DATE_DOB");
    }

    #[test]
    fn known_entities_have_expected_flags() {
        assert!(is_checksum_validatable("SSN"));
        assert!(is_high_risk("CREDIT_CARD"));
        assert_eq!(category("DIAGNOSIS"), "health.condition");
    }

    #[test]
    fn enumerate_by_category_filters_by_prefix() {
        let quasi = enumerate_by_category("quasi_identifier");
        assert!(quasi.contains(&"ZIP_CODE"));
        assert!(!quasi.contains(&"SSN"));
    }

    #[test]
    fn builtin_registry_loads_nonempty() {
        assert!(!registry().is_empty());
        assert!(!aliases().is_empty());
    }

    #[test]
    fn malformed_entry_is_skipped_not_fatal() {
        let yaml = r#"
entities:
  SSN:
    weight: 99
    category: direct_identifier.national_id
  EMPTY_CATEGORY:
    weight: 3
    category: ""
"#;
        let (entities, _) = load_registry(yaml).unwrap();
        assert!(entities.is_empty());
    }
}
