//! JWT algorithm validation.
//!
//! This module pins token verification to a single algorithm, ensuring a
//! token can never downgrade or substitute the algorithm the platform
//! signs with.
//!
//! # Security
//!
//! Per RFC 8725 Section 3.1, validators must reject algorithms they do not
//! fully implement. keygate signs exclusively with HS384, so everything
//! else — including `none` and the other HMAC variants — is rejected
//! before any signature check runs. A mismatched algorithm is reported as
//! [`AuthError::InvalidSignature`]: accepting the attacker's framing that
//! the token merely "uses another algorithm" would leak which algorithms
//! the verifier distinguishes.

use crate::error::AuthError;

/// The only JWT algorithm accepted for session tokens.
///
/// HS384 is the platform's signing algorithm end to end; 48-byte keys
/// satisfy the RFC 7518 minimum key size for it. Widening this list
/// requires extending the signer itself — listing an algorithm here
/// without full signing support would violate RFC 8725.
pub const ACCEPTED_ALGORITHMS: &[&str] = &["HS384"];

/// Validates a token header algorithm against the accepted list.
///
/// # Errors
///
/// Returns [`AuthError::InvalidSignature`] for any algorithm other than
/// HS384.
///
/// # Examples
///
/// ```
/// use keygate_authn::validate_algorithm;
///
/// assert!(validate_algorithm("HS384").is_ok());
/// assert!(validate_algorithm("HS256").is_err());
/// assert!(validate_algorithm("none").is_err());
/// ```
pub fn validate_algorithm(alg: &str) -> Result<(), AuthError> {
    if !ACCEPTED_ALGORITHMS.contains(&alg) {
        return Err(AuthError::InvalidSignature);
    }
    Ok(())
}
