//! Signing-key naming convention and key-set parsing.
//!
//! JWT signing keys live in a secret record under names of the form
//! `jwt-signing-key-<unix-seconds>`, where the timestamp records when the
//! rotator created the key and doubles as the key ID (`kid`) emitted in
//! token headers. This module is the single canonical implementation of
//! that convention, used by both the auth middleware and the rotator.
//!
//! Timestamps are always compared numerically. The parsed `i64` travels
//! with each key inside [`SigningKey`], so no consumer ever has to order
//! kid strings — decimal strings of different lengths do not sort
//! lexically the way their values sort numerically.

use std::collections::HashMap;

use base64::{Engine, engine::general_purpose::STANDARD};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::record::SecretRecord;

/// Prefix for JWT signing key entries in the secret record.
pub const SIGNING_KEY_PREFIX: &str = "jwt-signing-key-";

/// Size of signing keys in bytes (384 bits).
///
/// Must be at least 48 bytes for HS384 per RFC 7518 Section 3.2.
pub const SIGNING_KEY_SIZE: usize = 48;

/// Errors produced while decoding signing-key entries from a record.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum KeysetError {
    /// An entry carries the signing-key prefix but fails validation.
    ///
    /// Prefixed-but-bad names are corruption, not foreign data — parsers
    /// fail the whole record rather than silently dropping the entry.
    #[error("malformed signing key entry {name}: {reason}")]
    MalformedKey {
        /// The offending entry name.
        name: String,
        /// What failed to validate.
        reason: String,
    },

    /// The record contains no signing-key entries at all.
    #[error("no signing keys found in record")]
    NoKeys,
}

/// Builds the entry name for a signing key created at `timestamp`.
#[must_use]
pub fn signing_key_name(timestamp: i64) -> String {
    format!("{SIGNING_KEY_PREFIX}{timestamp}")
}

/// Extracts the creation timestamp from a signing-key entry name.
///
/// # Errors
///
/// Returns [`KeysetError::MalformedKey`] if the prefix is missing, the
/// suffix is empty, or the suffix is not a decimal `i64`.
pub fn parse_key_timestamp(name: &str) -> Result<i64, KeysetError> {
    let Some(suffix) = name.strip_prefix(SIGNING_KEY_PREFIX) else {
        return Err(KeysetError::MalformedKey {
            name: name.to_owned(),
            reason: format!("missing `{SIGNING_KEY_PREFIX}` prefix"),
        });
    };

    if suffix.is_empty() {
        return Err(KeysetError::MalformedKey {
            name: name.to_owned(),
            reason: "empty timestamp suffix".to_owned(),
        });
    }

    suffix.parse::<i64>().map_err(|e| KeysetError::MalformedKey {
        name: name.to_owned(),
        reason: format!("invalid timestamp suffix: {e}"),
    })
}

/// A single signing key with its creation timestamp.
///
/// The timestamp is the numeric form of the kid; consumers order keys by
/// it rather than by the kid string.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey {
    /// Creation time in unix seconds (numeric kid).
    pub timestamp: i64,
    /// Raw HMAC key material, scrubbed from memory on drop.
    pub secret: Zeroizing<Vec<u8>>,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("timestamp", &self.timestamp)
            .field("secret", &format!("<{} bytes>", self.secret.len()))
            .finish()
    }
}

/// All signing keys parsed from one secret record, viewed as `kid → key`.
#[derive(Debug, Clone)]
pub struct SigningKeySet {
    /// Keys indexed by kid (the stringified timestamp).
    pub keys: HashMap<String, SigningKey>,
    /// The kid with the numerically greatest timestamp.
    pub latest_kid: String,
}

impl SigningKeySet {
    /// Parses all signing-key entries from a record.
    ///
    /// Entries without the [`SIGNING_KEY_PREFIX`] are skipped silently —
    /// the record may carry auxiliary metadata. Prefixed entries must
    /// decode to a timestamp and hold exactly [`SIGNING_KEY_SIZE`] bytes;
    /// any that don't fail the whole parse.
    ///
    /// # Errors
    ///
    /// - [`KeysetError::MalformedKey`] on a prefixed entry with a bad name or wrong key length
    /// - [`KeysetError::NoKeys`] when no prefixed entries exist
    pub fn parse(record: &SecretRecord) -> Result<Self, KeysetError> {
        let mut keys = HashMap::new();
        let mut latest: Option<(i64, String)> = None;

        for (name, value) in &record.data {
            if !name.starts_with(SIGNING_KEY_PREFIX) {
                continue;
            }

            let timestamp = parse_key_timestamp(name)?;

            if value.len() != SIGNING_KEY_SIZE {
                return Err(KeysetError::MalformedKey {
                    name: name.clone(),
                    reason: format!("expected {SIGNING_KEY_SIZE}-byte key, got {}", value.len()),
                });
            }

            let kid = name[SIGNING_KEY_PREFIX.len()..].to_owned();
            if latest.as_ref().is_none_or(|&(t, _)| timestamp > t) {
                latest = Some((timestamp, kid.clone()));
            }
            keys.insert(kid, SigningKey { timestamp, secret: value.clone() });
        }

        let Some((_, latest_kid)) = latest else {
            return Err(KeysetError::NoKeys);
        };

        Ok(Self { keys, latest_kid })
    }

    /// Returns the number of keys in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if the set holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Looks up a key by kid.
    #[must_use]
    pub fn get(&self, kid: &str) -> Option<&SigningKey> {
        self.keys.get(kid)
    }
}

/// Formats key material for safe display (base64, truncated).
///
/// Use this wherever a key must be referenced in logs or diagnostics —
/// never format raw key bytes.
#[must_use]
pub fn format_key_preview(key: &[u8]) -> String {
    if key.is_empty() {
        return "<empty>".to_owned();
    }
    let encoded = STANDARD.encode(key);
    if encoded.len() > 16 { format!("{}...", &encoded[..16]) } else { encoded }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn record_with(entries: &[(&str, &[u8])]) -> SecretRecord {
        let mut record = SecretRecord::new("auth-keys", "platform");
        for (name, value) in entries {
            record.data.insert((*name).to_owned(), Zeroizing::new(value.to_vec()));
        }
        record
    }

    fn key_bytes(fill: u8) -> [u8; SIGNING_KEY_SIZE] {
        [fill; SIGNING_KEY_SIZE]
    }

    #[test]
    fn signing_key_name_round_trip() {
        let name = signing_key_name(1_700_000_000);
        assert_eq!(name, "jwt-signing-key-1700000000");
        assert_eq!(parse_key_timestamp(&name).unwrap(), 1_700_000_000);
    }

    #[test]
    fn parse_key_timestamp_missing_prefix() {
        let result = parse_key_timestamp("other-key-1000");
        assert!(matches!(result, Err(KeysetError::MalformedKey { .. })));
    }

    #[test]
    fn parse_key_timestamp_empty_suffix() {
        let result = parse_key_timestamp("jwt-signing-key-");
        assert!(matches!(result, Err(KeysetError::MalformedKey { .. })));
    }

    #[test]
    fn parse_key_timestamp_non_numeric_suffix() {
        let result = parse_key_timestamp("jwt-signing-key-notanumber");
        assert!(matches!(result, Err(KeysetError::MalformedKey { .. })));
    }

    #[test]
    fn parse_set_picks_numerically_latest_kid() {
        let record = record_with(&[
            ("jwt-signing-key-1000", &key_bytes(b'a')),
            ("jwt-signing-key-3000", &key_bytes(b'b')),
            ("jwt-signing-key-2000", &key_bytes(b'c')),
        ]);

        let set = SigningKeySet::parse(&record).expect("parse");

        assert_eq!(set.len(), 3);
        assert_eq!(set.latest_kid, "3000");
        assert_eq!(set.get("1000").unwrap().timestamp, 1000);
    }

    #[test]
    fn parse_set_numeric_order_beats_lexical_order() {
        // "999" > "1000" lexically but 999 < 1000 numerically.
        let record = record_with(&[
            ("jwt-signing-key-999", &key_bytes(b'a')),
            ("jwt-signing-key-1000", &key_bytes(b'b')),
        ]);

        let set = SigningKeySet::parse(&record).expect("parse");

        assert_eq!(set.latest_kid, "1000");
    }

    #[test]
    fn parse_set_skips_foreign_entries() {
        let record = record_with(&[
            ("jwt-signing-key-1000", &key_bytes(b'a')),
            ("tls.crt", b"not a signing key"),
            ("api-token", b"also not a signing key"),
        ]);

        let set = SigningKeySet::parse(&record).expect("parse");

        assert_eq!(set.len(), 1);
        assert_eq!(set.latest_kid, "1000");
    }

    #[test]
    fn parse_set_fails_on_malformed_prefixed_entry() {
        let record = record_with(&[
            ("jwt-signing-key-1000", &key_bytes(b'a')),
            ("jwt-signing-key-notanumber", b"0123456789"),
        ]);

        let result = SigningKeySet::parse(&record);

        assert!(matches!(result, Err(KeysetError::MalformedKey { .. })));
    }

    #[test]
    fn parse_set_fails_on_wrong_key_length() {
        let record = record_with(&[("jwt-signing-key-1000", b"too short".as_slice())]);

        let result = SigningKeySet::parse(&record);

        assert!(
            matches!(result, Err(KeysetError::MalformedKey { ref reason, .. }) if reason.contains("48-byte"))
        );
    }

    #[test]
    fn parse_set_fails_on_empty_record() {
        let record = record_with(&[("unrelated", b"data".as_slice())]);

        let result = SigningKeySet::parse(&record);

        assert_eq!(result.unwrap_err(), KeysetError::NoKeys);
    }

    #[test]
    fn signing_key_debug_redacts_secret() {
        let key =
            SigningKey { timestamp: 1000, secret: Zeroizing::new(key_bytes(b'z').to_vec()) };

        let debug = format!("{key:?}");
        assert!(debug.contains("1000"));
        assert!(debug.contains("<48 bytes>"));
        assert!(!debug.contains('z'));
    }

    #[test]
    fn format_key_preview_truncates() {
        let preview = format_key_preview(&key_bytes(b'A'));
        assert_eq!(preview.len(), 19); // 16 chars + "..."
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn format_key_preview_empty() {
        assert_eq!(format_key_preview(&[]), "<empty>");
    }

    #[test]
    fn format_key_preview_short_input_not_truncated() {
        assert_eq!(format_key_preview(b"ab"), "YWI=");
    }

    mod proptests {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            /// Encoding then decoding any timestamp must produce the original value.
            #[test]
            fn name_timestamp_round_trip(timestamp in any::<i64>()) {
                let name = signing_key_name(timestamp);
                prop_assert_eq!(parse_key_timestamp(&name).expect("round trip"), timestamp);
            }

            /// Non-negative timestamps produce names matching the wire regex
            /// `^jwt-signing-key-([0-9]+)$`.
            #[test]
            fn names_match_wire_format(timestamp in 0i64..) {
                let name = signing_key_name(timestamp);
                let suffix = name.strip_prefix(SIGNING_KEY_PREFIX).expect("prefix");
                prop_assert!(!suffix.is_empty());
                prop_assert!(suffix.chars().all(|c| c.is_ascii_digit()));
            }

            /// The latest kid is always the numeric maximum, regardless of how
            /// the decimal strings would sort lexically.
            #[test]
            fn latest_kid_is_numeric_max(timestamps in proptest::collection::btree_set(0i64..=9_999_999_999, 1..8)) {
                let mut record = SecretRecord::new("auth-keys", "platform");
                for &ts in &timestamps {
                    record.data.insert(
                        signing_key_name(ts),
                        Zeroizing::new(vec![0x41; SIGNING_KEY_SIZE]),
                    );
                }

                let set = SigningKeySet::parse(&record).expect("parse");
                let max = timestamps.iter().max().expect("non-empty");
                prop_assert_eq!(set.latest_kid, max.to_string());
            }

            /// Arbitrary suffix garbage after the prefix never parses unless it
            /// is a plain decimal integer.
            #[test]
            fn garbage_suffixes_rejected(suffix in "[a-zA-Z_. ]{1,12}") {
                let name = format!("{SIGNING_KEY_PREFIX}{suffix}");
                prop_assert!(parse_key_timestamp(&name).is_err());
            }
        }
    }
}
