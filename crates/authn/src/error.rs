//! Authentication error types.
//!
//! This module defines errors that can occur during token issuance, token
//! validation, and signing-key reloads. Verification outcomes are distinct
//! variants because callers differentiate them: an expired token prompts a
//! refresh, an invalid one is rejected outright.

use std::time::Duration;

use keygate_keystore::{KeysetError, StoreError};
use thiserror::Error;

/// Authentication errors.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]` — new variants may be added in
/// future minor releases without a semver-breaking change. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    /// Token has expired.
    #[error("token expired")]
    TokenExpired,

    /// Signature verification failed, or the token's algorithm is not
    /// HS384 (algorithm substitution is treated as a signature failure).
    #[error("invalid signature")]
    InvalidSignature,

    /// The token's `kid` names a key this signer does not hold.
    ///
    /// Expected for tokens signed with a pruned key; also the symptom of a
    /// replica that has not yet observed a rotation.
    #[error("unknown key ID: {kid}")]
    UnknownKid {
        /// The key ID from the token header.
        kid: String,
    },

    /// A registered claim failed validation (issuer, audience, timing).
    #[error("invalid claims: {0}")]
    InvalidClaims(String),

    /// Malformed token — cannot be decoded.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Every held key is still inside the cool-off window.
    ///
    /// Transient during rotation; the caller should retry after the
    /// cool-off elapses. Not an error-level condition.
    #[error("no signing key available beyond the cool-off period ({delay:?})")]
    NoUsableKey {
        /// The configured cool-off.
        delay: Duration,
    },

    /// A key-set update failed its preconditions.
    #[error("invalid key update: {0}")]
    InvalidUpdate(String),

    /// The store record could not be decoded into a key set.
    #[error(transparent)]
    Keyset(#[from] KeysetError),

    /// A store operation failed.
    ///
    /// Wraps the original [`StoreError`] to preserve the full error source
    /// chain for debugging and structured logging.
    #[error("key store error: {0}")]
    Store(#[source] StoreError),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::Store(err)
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            // The validation's algorithm pin rejected the header algorithm.
            ErrorKind::InvalidAlgorithm => AuthError::InvalidSignature,
            ErrorKind::ImmatureSignature => AuthError::InvalidClaims("token not yet valid".into()),
            ErrorKind::InvalidIssuer => AuthError::InvalidClaims("issuer mismatch".into()),
            ErrorKind::InvalidAudience => AuthError::InvalidClaims("audience mismatch".into()),
            ErrorKind::MissingRequiredClaim(claim) => {
                AuthError::InvalidClaims(format!("missing required claim: {claim}"))
            },
            ErrorKind::Json(_) => AuthError::InvalidToken("invalid JSON in claims".into()),
            ErrorKind::Base64(_) => AuthError::InvalidToken("invalid base64 encoding".into()),
            ErrorKind::InvalidToken => AuthError::InvalidToken("malformed token".into()),
            _ => AuthError::InvalidToken(format!("token validation failed: {err}")),
        }
    }
}

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;
