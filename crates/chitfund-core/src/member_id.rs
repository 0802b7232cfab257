// crates/chitfund-core/src/member_id.rs
//
// Member identifier generation.
//
// Format: 3-letter prefix + 4 digits + 1 trailing letter, e.g. `AGR0421K`.
// The prefix is fixed per deployment; body and suffix are random. With a
// fixed prefix there are 10^4 * 26 = 260,000 identifiers.

use std::collections::HashSet;

use rand::Rng;

use crate::error::ChitError;

/// Default deployment prefix.
pub const DEFAULT_PREFIX: &str = "AGR";

/// Maximum random attempts before giving up.
pub const MAX_ATTEMPTS: u32 = 1000;

const LETTERS: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generate an identifier not present in `existing`.
///
/// # Errors
/// - `ChitError::Validation` if `prefix` is not exactly three ASCII uppercase letters.
/// - `ChitError::GenerationExhausted` after [`MAX_ATTEMPTS`] collisions.
pub fn generate_member_id<R: Rng + ?Sized>(
    prefix: &str,
    existing: &HashSet<String>,
    rng: &mut R,
) -> Result<String, ChitError> {
    validate_prefix(prefix)?;

    for _ in 0..MAX_ATTEMPTS {
        let digits: u16 = rng.gen_range(0..10_000);
        let letter = LETTERS[rng.gen_range(0..LETTERS.len())] as char;
        let candidate = format!("{}{:04}{}", prefix, digits, letter);
        if !existing.contains(&candidate) {
            return Ok(candidate);
        }
    }

    Err(ChitError::GenerationExhausted {
        attempts: MAX_ATTEMPTS,
    })
}

/// Check that `prefix` is three ASCII uppercase letters.
pub fn validate_prefix(prefix: &str) -> Result<(), ChitError> {
    if prefix.len() == 3 && prefix.bytes().all(|b| b.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(ChitError::Validation(format!(
            "Member ID prefix must be three uppercase letters, got {:?}",
            prefix
        )))
    }
}

/// Whether `id` has the shape `^[A-Z]{3}\d{4}[A-Z]$`.
pub fn is_valid_member_id(id: &str) -> bool {
    let bytes = id.as_bytes();
    bytes.len() == 8
        && bytes[..3].iter().all(u8::is_ascii_uppercase)
        && bytes[3..7].iter().all(u8::is_ascii_digit)
        && bytes[7].is_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_id_matches_format() {
        let re = regex::Regex::new(r"^[A-Z]{3}\d{4}[A-Z]$").unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let existing = HashSet::new();
        for _ in 0..500 {
            let id = generate_member_id(DEFAULT_PREFIX, &existing, &mut rng).unwrap();
            assert!(re.is_match(&id), "bad id {id}");
            assert!(is_valid_member_id(&id));
            assert!(id.starts_with("AGR"));
        }
    }

    #[test]
    fn test_avoids_existing_ids() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut existing = HashSet::new();
        for _ in 0..2_000 {
            let id = generate_member_id("KUR", &existing, &mut rng).unwrap();
            assert!(existing.insert(id), "generator returned a duplicate");
        }
        assert_eq!(existing.len(), 2_000);
    }

    #[test]
    fn test_exhausted_when_space_is_full() {
        // Occupy every identifier for the prefix.
        let mut existing = HashSet::with_capacity(260_000);
        for n in 0..10_000u16 {
            for &l in LETTERS.iter() {
                existing.insert(format!("ZZZ{:04}{}", n, l as char));
            }
        }
        let mut rng = StdRng::seed_from_u64(1);
        let err = generate_member_id("ZZZ", &existing, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            ChitError::GenerationExhausted { attempts: MAX_ATTEMPTS }
        ));
    }

    #[test]
    fn test_rejects_bad_prefix() {
        let mut rng = StdRng::seed_from_u64(3);
        let existing = HashSet::new();
        assert!(generate_member_id("ag", &existing, &mut rng).is_err());
        assert!(generate_member_id("AGRX", &existing, &mut rng).is_err());
        assert!(generate_member_id("A1R", &existing, &mut rng).is_err());
    }

    #[test]
    fn test_is_valid_member_id() {
        assert!(is_valid_member_id("AGR0001A"));
        assert!(!is_valid_member_id("AGR001A"));
        assert!(!is_valid_member_id("agr0001A"));
        assert!(!is_valid_member_id("AGR00011"));
    }
}
