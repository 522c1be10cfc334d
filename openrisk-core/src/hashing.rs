//! Value normalization and label hashing.

use sha2::{Digest, Sha256};

/// Per-entity-type normalization applied before hashing (and, for
/// checksum detectors, before validation). Keeping this in one place
/// means the detector contract documents normalization exactly once.
pub fn normalize_value(entity_type: &str, value: &str) -> String {
    let value = value.trim();
    match entity_type {
        "SSN" | "CREDIT_CARD" | "ABA_ROUTING" | "PHONE" => {
            value.chars().filter(|c| c.is_ascii_digit()).collect()
        }
        _ => value.to_string(),
    }
}

/// `label_hash(value) = lowercase_hex(sha256(utf8(value)))[0:6]`.
/// Always returns exactly 6 lowercase hex characters.
pub fn label_hash(normalized_value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalized_value.as_bytes());
    let digest = hasher.finalize();
    let hex = digest.iter().map(|b| format!("{b:02x}")).collect::<String>();
    hex[0..6].to_string()
}

/// Normalizes then hashes in one step -- the path detectors should use.
pub fn hash_value(entity_type: &str, raw_value: &str) -> String {
    label_hash(&normalize_value(entity_type, raw_value))
}

/// Full (untruncated) lowercase-hex SHA-256, used for the scoring-result
/// JSON's `content_hash` field -- unlike `label_hash`, nothing here is
/// meant to key a short cross-system correlation, so there is no reason
/// to truncate it.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_six_lowercase_hex_chars() {
        let h = label_hash("123456789");
        assert_eq!(h.len(), 6);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn equal_inputs_hash_equal() {
        assert_eq!(label_hash("abc"), label_hash("abc"));
    }

    #[test]
    fn ssn_normalization_strips_punctuation() {
        assert_eq!(normalize_value("SSN", "123-45-6789"), "123456789");
        assert_eq!(hash_value("SSN", "123-45-6789"), hash_value("SSN", "123456789"));
    }

    #[test]
    fn credit_card_normalization_strips_spaces() {
        assert_eq!(normalize_value("CREDIT_CARD", "4111 1111 1111 1111"), "4111111111111111");
    }

    #[test]
    fn sha256_hex_is_64_lowercase_hex_chars() {
        let h = sha256_hex(b"hello world");
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn sha256_hex_matches_known_vector() {
        assert_eq!(sha256_hex(b""), "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855");
    }
}
