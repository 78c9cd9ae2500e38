//! Shared test utilities for authentication testing.
//!
//! This module provides common helpers for building 48-byte test secrets,
//! seeding store records with signing keys, constructing key sets, and
//! crafting raw JWT strings (for attack testing). It is feature-gated
//! behind `testutil` to prevent leaking into production builds.
//!
//! # Usage
//!
//! In integration tests, enable the feature in `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! keygate-authn = { path = "../authn", features = ["testutil"] }
//! ```

use std::collections::HashMap;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use keygate_keystore::{
    SIGNING_KEY_SIZE, SecretRecord, SigningKey, SigningKeySet, keyset::signing_key_name,
};
use zeroize::Zeroizing;

/// Returns a 48-byte test secret filled with `fill`.
///
/// Deterministic fills make cross-signer tests readable: two signers built
/// from the same `(timestamp, fill)` pairs hold identical key material.
#[must_use]
pub fn test_secret(fill: u8) -> Zeroizing<Vec<u8>> {
    Zeroizing::new(vec![fill; SIGNING_KEY_SIZE])
}

/// Builds a signing key set from `(timestamp, fill)` pairs.
///
/// The latest kid is the numerically greatest timestamp.
///
/// # Panics
///
/// Panics if `keys` is empty.
#[must_use]
pub fn signing_key_set(keys: &[(i64, u8)]) -> SigningKeySet {
    let latest = keys.iter().map(|&(ts, _)| ts).max().expect("at least one key");
    let keys: HashMap<String, SigningKey> = keys
        .iter()
        .map(|&(ts, fill)| (ts.to_string(), SigningKey { timestamp: ts, secret: test_secret(fill) }))
        .collect();
    SigningKeySet { keys, latest_kid: latest.to_string() }
}

/// Builds a secret record seeded with signing keys from `(timestamp, fill)`
/// pairs.
#[must_use]
pub fn seed_record(name: &str, namespace: &str, keys: &[(i64, u8)]) -> SecretRecord {
    let mut record = SecretRecord::new(name, namespace);
    for &(ts, fill) in keys {
        record.data.insert(signing_key_name(ts), test_secret(fill));
    }
    record
}

/// Creates a raw JWT string from arbitrary header and payload JSON.
///
/// The resulting token has the structure `{header_b64}.{payload_b64}.`
/// with an empty signature. This is useful for testing rejection of
/// malformed or attack JWTs (e.g. `alg: "none"`).
///
/// # Panics
///
/// Panics if JSON serialization fails.
#[must_use]
pub fn craft_raw_jwt(header_json: &serde_json::Value, payload_json: &serde_json::Value) -> String {
    let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(header_json).expect("header json"));
    let payload_b64 =
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload_json).expect("payload json"));
    format!("{header_b64}.{payload_b64}.")
}
