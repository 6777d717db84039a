//! Deterministic product identifiers derived from the business key

use sha2::{Digest, Sha256};
use ulid::Ulid;

use super::entity::ProductId;

/// Separator placed between the normalized name and reference number
const SEED_SEPARATOR: char = '|';

/// Number of hash bytes used as ULID randomness (80 bits)
const ENTROPY_BYTES: usize = 10;

/// Normalizes an attribute for identity and index purposes: trim + lowercase.
pub fn normalize_attribute(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Generates the product identifier for a (name, reference number) pair.
///
/// The identifier is a ULID with a zero timestamp whose randomness is taken
/// from the SHA-256 digest of the normalized business key, so equal keys
/// always map to the same 26-character id regardless of case or surrounding
/// whitespace.
pub fn generate_product_id(name: &str, reference_number: &str) -> ProductId {
    let seed = format!(
        "{}{}{}",
        normalize_attribute(name),
        SEED_SEPARATOR,
        normalize_attribute(reference_number)
    );

    let digest = Sha256::digest(seed.as_bytes());

    let mut random_bytes = [0u8; 16];
    random_bytes[16 - ENTROPY_BYTES..].copy_from_slice(&digest[..ENTROPY_BYTES]);

    let ulid = Ulid::from_parts(0, u128::from_be_bytes(random_bytes));
    ProductId::new(ulid.to_string())
}
