//! Rotation error types.

use keygate_keystore::{KeysetError, StoreError};
use thiserror::Error;

/// Errors produced by rotation operations.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]` — new variants may be added in
/// future minor releases without a semver-breaking change. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RotateError {
    /// The retention count is below the minimum of one key.
    #[error("number of retained keys must be at least 1, got {got}")]
    InvalidKeyCount {
        /// The rejected retention count.
        got: usize,
    },

    /// A key for the current wall-clock second already exists.
    ///
    /// Keys are addressed by second-precision timestamps, so two rotations
    /// within one second would alias. Failing without mutating the store
    /// is safer than overwriting or inventing skewed timestamps; at real
    /// rotation cadences this only occurs under pathological clock
    /// regressions.
    #[error("signing key for timestamp {timestamp} already exists, refusing to overwrite")]
    ClockCollision {
        /// The colliding timestamp.
        timestamp: i64,
    },

    /// The random source failed to produce key material.
    #[error("failed to generate key material: {0}")]
    Crypto(String),

    /// The record's signing-key entries failed strict validation.
    #[error(transparent)]
    Keyset(#[from] KeysetError),

    /// A store operation failed.
    #[error("key store error: {0}")]
    Store(#[source] StoreError),
}

impl From<StoreError> for RotateError {
    fn from(err: StoreError) -> Self {
        RotateError::Store(err)
    }
}
