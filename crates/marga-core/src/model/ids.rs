//! Opaque identifier generation.
//!
//! IDs take the form `<prefix>-<hex>` where the hex suffix is the first
//! [`ID_HEX_LEN`] characters of a BLAKE3 hash over the prefix, a seed string,
//! the wall clock, and a random nonce. IDs are opaque: nothing parses them.

use chrono::Utc;

/// Number of hex characters kept from the hash.
pub const ID_HEX_LEN: usize = 12;

/// Prefix for project IDs.
pub const PROJECT_PREFIX: &str = "prj";
/// Prefix for BoQ item IDs.
pub const BOQ_PREFIX: &str = "boq";
/// Prefix for weekly report IDs.
pub const REPORT_PREFIX: &str = "wr";

/// Generate a fresh opaque ID.
///
/// `seed` mixes caller context (e.g. a project name) into the hash so IDs
/// minted in the same microsecond still differ even before the nonce.
#[must_use]
pub fn generate_id(prefix: &str, seed: &str) -> String {
    let nonce: u64 = rand::random();
    let now_us = Utc::now().timestamp_micros();

    let mut hasher = blake3::Hasher::new();
    hasher.update(prefix.as_bytes());
    hasher.update(b"\0");
    hasher.update(seed.as_bytes());
    hasher.update(b"\0");
    hasher.update(&now_us.to_le_bytes());
    hasher.update(&nonce.to_le_bytes());

    let hex = hasher.finalize().to_hex();
    format!("{prefix}-{}", &hex.as_str()[..ID_HEX_LEN])
}
