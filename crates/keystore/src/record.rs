//! Secret record type shared by store backends and their consumers.

use std::{collections::BTreeMap, fmt};

use zeroize::Zeroizing;

/// A named record of opaque byte entries in a namespace.
///
/// Signing keys live in `data` under the naming convention decoded by
/// [`keyset`](crate::keyset); entries with other names are auxiliary
/// metadata that readers ignore and writers preserve verbatim.
///
/// # Versioning
///
/// `version` is the store's optimistic-concurrency token. [`update`]
/// succeeds only when the caller's version matches the stored one, and the
/// store bumps it on every successful write. A record obtained from `get`
/// therefore carries everything needed for a read-modify-write cycle.
///
/// # Secret Hygiene
///
/// Entry values are wrapped in [`Zeroizing`] so key material is scrubbed
/// from memory on drop, and the [`Debug`] implementation redacts values to
/// name and length only. Key bytes never reach logs through formatting.
///
/// [`update`]: crate::store::SecretStore::update
#[derive(Clone, PartialEq, Eq)]
pub struct SecretRecord {
    /// Record name (unique within the namespace).
    pub name: String,

    /// Namespace the record lives in.
    pub namespace: String,

    /// Store-assigned version for optimistic concurrency.
    pub version: u64,

    /// Opaque entries, keyed by entry name.
    pub data: BTreeMap<String, Zeroizing<Vec<u8>>>,
}

impl SecretRecord {
    /// Creates an empty record with version 0 (never stored yet).
    #[must_use]
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self { name: name.into(), namespace: namespace.into(), version: 0, data: BTreeMap::new() }
    }
}

impl fmt::Debug for SecretRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Values are redacted: only entry names and byte lengths are shown.
        let entries: BTreeMap<&str, String> =
            self.data.iter().map(|(k, v)| (k.as_str(), format!("<{} bytes>", v.len()))).collect();
        f.debug_struct("SecretRecord")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("version", &self.version)
            .field("data", &entries)
            .finish()
    }
}
