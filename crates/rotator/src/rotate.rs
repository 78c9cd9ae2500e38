//! Generate-append-prune rotation over a secret record.

use chrono::Utc;
use keygate_keystore::{
    SIGNING_KEY_PREFIX, SIGNING_KEY_SIZE, SecretRecord, SecretStore,
    keyset::{self, KeysetError, format_key_preview},
};
use rand_core::{OsRng, RngCore};
use zeroize::Zeroizing;

use crate::error::RotateError;

/// Generates a cryptographically random 48-byte signing key.
///
/// # Errors
///
/// Returns [`RotateError::Crypto`] if the operating system's random source
/// fails.
pub fn generate_key() -> Result<Zeroizing<Vec<u8>>, RotateError> {
    let mut key = Zeroizing::new(vec![0u8; SIGNING_KEY_SIZE]);
    OsRng.try_fill_bytes(&mut key).map_err(|e| RotateError::Crypto(e.to_string()))?;
    Ok(key)
}

/// Rotates the signing keys in a secret record.
///
/// Generates a new key named for the current wall-clock second, appends it
/// to the record, prunes the oldest keys so at most `number_of_keys`
/// remain, and persists the record in one optimistic update. Entries that
/// don't carry the signing-key prefix are left untouched; prefixed entries
/// whose names fail to parse are skipped with a warning rather than
/// deleted — unknown corruption is preserved for operators, not cleaned up.
///
/// # Errors
///
/// - [`RotateError::InvalidKeyCount`] — `number_of_keys` is zero
/// - [`RotateError::ClockCollision`] — a key for this second already exists; the store is left
///   unchanged
/// - [`RotateError::Crypto`] — the random source failed
/// - [`RotateError::Store`] — fetching or persisting the record failed, including
///   [`Conflict`](keygate_keystore::StoreError::Conflict) when another writer won the update race
pub async fn rotate(
    store: &dyn SecretStore,
    name: &str,
    namespace: &str,
    number_of_keys: usize,
) -> Result<(), RotateError> {
    rotate_at(store, name, namespace, number_of_keys, Utc::now().timestamp()).await
}

/// [`rotate`] with a caller-supplied timestamp, so the one-second aliasing
/// path is testable without sleeping across second boundaries.
pub(crate) async fn rotate_at(
    store: &dyn SecretStore,
    name: &str,
    namespace: &str,
    number_of_keys: usize,
    now: i64,
) -> Result<(), RotateError> {
    if number_of_keys < 1 {
        return Err(RotateError::InvalidKeyCount { got: number_of_keys });
    }

    let mut record = store.get(name, namespace).await?;

    // (entry name, timestamp) for every well-formed signing key.
    let mut entries: Vec<(String, i64)> = Vec::with_capacity(record.data.len());
    for entry_name in record.data.keys() {
        if !entry_name.starts_with(SIGNING_KEY_PREFIX) {
            continue;
        }
        match keyset::parse_key_timestamp(entry_name) {
            Ok(timestamp) => entries.push((entry_name.clone(), timestamp)),
            Err(err) => {
                tracing::warn!(entry = %entry_name, error = %err, "skipping malformed signing key entry");
            },
        }
    }

    let new_name = keyset::signing_key_name(now);
    if record.data.contains_key(&new_name) {
        return Err(RotateError::ClockCollision { timestamp: now });
    }

    let new_key = generate_key()?;
    tracing::debug!(entry = %new_name, key = %format_key_preview(&new_key), "generated signing key");
    record.data.insert(new_name.clone(), new_key);
    entries.push((new_name.clone(), now));

    entries.sort_by_key(|&(_, timestamp)| timestamp);

    if entries.len() > number_of_keys {
        let pruned: Vec<String> =
            entries.drain(..entries.len() - number_of_keys).map(|(name, _)| name).collect();
        for entry_name in &pruned {
            record.data.remove(entry_name);
        }
        tracing::info!(pruned = ?pruned, "pruned old signing keys");
    }

    store.update(&record).await?;

    tracing::info!(
        secret = %name,
        namespace = %namespace,
        added = %new_name,
        remaining = entries.len(),
        "rotated signing keys"
    );

    Ok(())
}

/// Checks that a record holds at least one well-formed signing key.
///
/// Unlike [`rotate`], which tolerates malformed entries to avoid livelock,
/// this health check is strict: any prefixed-but-malformed entry is fatal.
/// Intended for human-operated diagnostics.
///
/// # Errors
///
/// - [`RotateError::Keyset`] — a malformed prefixed entry, or no signing keys at all
/// - [`RotateError::Store`] — fetching the record failed
pub async fn validate(
    store: &dyn SecretStore,
    name: &str,
    namespace: &str,
) -> Result<(), RotateError> {
    let record = store.get(name, namespace).await?;

    let mut key_count = 0usize;
    for entry_name in record.data.keys() {
        if !entry_name.starts_with(SIGNING_KEY_PREFIX) {
            continue;
        }
        keyset::parse_key_timestamp(entry_name)?;
        key_count += 1;
    }

    if key_count == 0 {
        return Err(RotateError::Keyset(KeysetError::NoKeys));
    }

    Ok(())
}

/// Returns the kid of the newest signing key in a record.
///
/// Malformed entries are skipped, matching [`rotate`]'s tolerance.
///
/// # Errors
///
/// Returns [`KeysetError::NoKeys`] when no entry parses.
pub fn latest_key_id(record: &SecretRecord) -> Result<String, KeysetError> {
    let mut latest: Option<(i64, &str)> = None;

    for entry_name in record.data.keys() {
        if !entry_name.starts_with(SIGNING_KEY_PREFIX) {
            continue;
        }
        let Ok(timestamp) = keyset::parse_key_timestamp(entry_name) else { continue };
        let kid = &entry_name[SIGNING_KEY_PREFIX.len()..];
        if latest.is_none_or(|(t, _)| timestamp > t) {
            latest = Some((timestamp, kid));
        }
    }

    latest.map(|(_, kid)| kid.to_owned()).ok_or(KeysetError::NoKeys)
}
