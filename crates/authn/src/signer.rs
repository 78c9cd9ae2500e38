//! Multi-key HMAC-SHA384 token signer.
//!
//! This module provides [`HmacSigner`], the in-memory signing and
//! verification engine shared by all request handlers of one middleware
//! replica. It holds every signing key currently in the store record, signs
//! with the newest key that has cleared the cool-off window, and verifies
//! against any held key by `kid`.
//!
//! # Cool-off
//!
//! A freshly rotated key exists in the store the moment the rotator writes
//! it, but replicas learn of it via an eventually-consistent watch. If this
//! replica signed with a new key immediately, another replica might receive
//! the token before its watch delivered the key and reject it as unknown.
//! The cool-off delay is the safety margin: a key signs only once it has
//! been held locally for at least `new_key_use_delay`, by which time the
//! watch is expected to have converged on every replica.
//!
//! Per kid, locally:
//!
//! ```text
//! ABSENT ──(update_keys)──▶ COOLING ──(delay elapsed)──▶ ACTIVE ──(pruned)──▶ GONE
//!
//! COOLING may verify.  ACTIVE may sign and verify.  ABSENT/GONE do neither.
//! ```
//!
//! # Concurrency
//!
//! One reader-writer lock guards all key state. `generate` and `validate`
//! take it for reading; `update_keys` (called by the store watcher) takes
//! it for writing. Kid selection and key fetch happen inside a single read
//! critical section, so a concurrent rotation can never remove the chosen
//! key between the two steps.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use keygate_keystore::{SigningKey, SigningKeySet};
use parking_lot::RwLock;

use crate::{
    claims::{SessionClaims, TokenRequest},
    error::AuthError,
    validation::validate_algorithm,
};

/// Leeway applied to `exp`/`nbf`/`iat` checks (clock skew tolerance).
const CLAIM_LEEWAY: Duration = Duration::from_secs(5);

/// Mutable key state, guarded by the signer's lock as one unit.
#[derive(Default)]
struct KeyState {
    /// Held keys, by kid.
    keys: HashMap<String, SigningKey>,
    /// When this replica first observed each kid. Not persisted; rebuilt
    /// from scratch on restart, which restarts the cool-off — safe, merely
    /// conservative.
    added_at: HashMap<String, Instant>,
}

/// HMAC-SHA384 token signer and verifier with hot key reload.
///
/// Created empty; keys must be loaded via
/// [`SecretWatcher::load_initial`](crate::SecretWatcher::load_initial)
/// before the first `generate` call can succeed.
pub struct HmacSigner {
    issuer: String,
    audience: String,
    expiration: Duration,
    new_key_use_delay: Duration,
    state: RwLock<KeyState>,
}

impl HmacSigner {
    /// Creates a signer with no keys.
    #[must_use]
    pub fn new(
        issuer: impl Into<String>,
        audience: impl Into<String>,
        expiration: Duration,
        new_key_use_delay: Duration,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            expiration,
            new_key_use_delay,
            state: RwLock::new(KeyState::default()),
        }
    }

    /// Atomically replaces the held key set.
    ///
    /// Kids already held keep their original observation time, so an
    /// in-progress cool-off is never restarted by a redelivered watch
    /// event. Kids absent from `set` are dropped along with their
    /// bookkeeping.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidUpdate`] if `set` is empty or its
    /// `latest_kid` is not among its keys.
    pub fn update_keys(&self, set: SigningKeySet) -> Result<(), AuthError> {
        if set.keys.is_empty() {
            return Err(AuthError::InvalidUpdate("key set is empty".into()));
        }
        if !set.keys.contains_key(&set.latest_kid) {
            return Err(AuthError::InvalidUpdate(format!(
                "latest kid {} not present in key set",
                set.latest_kid
            )));
        }

        let now = Instant::now();
        let mut state = self.state.write();

        let added_at = set
            .keys
            .keys()
            .map(|kid| (kid.clone(), state.added_at.get(kid).copied().unwrap_or(now)))
            .collect();

        state.keys = set.keys;
        state.added_at = added_at;

        Ok(())
    }

    /// Issues a signed session token.
    ///
    /// Signs with the numerically greatest kid whose local age is at least
    /// the cool-off delay.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NoUsableKey`] when every held key is still in
    /// cool-off (transient during rotation, or before the initial load).
    pub fn generate(&self, request: &TokenRequest) -> Result<String, AuthError> {
        // Kid selection and key fetch share one read critical section; a
        // rotation applied between them could otherwise drop the chosen kid.
        let (kid, encoding_key) = {
            let state = self.state.read();

            let mut usable: Option<(&String, &SigningKey)> = None;
            for (kid, key) in &state.keys {
                let Some(added) = state.added_at.get(kid) else { continue };
                if added.elapsed() < self.new_key_use_delay {
                    continue;
                }
                if usable.is_none_or(|(_, best)| key.timestamp > best.timestamp) {
                    usable = Some((kid, key));
                }
            }

            let Some((kid, key)) = usable else {
                return Err(AuthError::NoUsableKey { delay: self.new_key_use_delay });
            };

            (kid.clone(), EncodingKey::from_secret(&key.secret))
        };

        let now = Utc::now().timestamp() as u64;
        let claims = SessionClaims {
            iss: self.issuer.clone(),
            aud: vec![self.audience.clone()],
            sub: request.subject.clone(),
            exp: now + self.expiration.as_secs(),
            iat: now,
            nbf: now,
            user: request.subject.clone(),
            groups: request.groups.clone(),
            uid: request.uid.clone(),
            extra: request.extra.clone(),
            path: request.path.clone(),
            domain: request.domain.clone(),
            token_type: request.token_type.clone(),
            skip_refresh: false,
        };

        let mut header = Header::new(Algorithm::HS384);
        header.kid = Some(kid);

        Ok(jsonwebtoken::encode(&header, &claims, &encoding_key)?)
    }

    /// Validates a token and returns its claims.
    ///
    /// Requires an HS384 header with a non-empty `kid` naming a held key;
    /// verifies the signature and the registered claims (issuer, audience,
    /// expiry with 5 s leeway).
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidSignature`] — bad signature, or any algorithm other than HS384
    /// - [`AuthError::UnknownKid`] — the kid is not held (e.g. signed with a pruned key)
    /// - [`AuthError::TokenExpired`] — `exp` is in the past
    /// - [`AuthError::InvalidClaims`] — issuer/audience/timing mismatch
    /// - [`AuthError::InvalidToken`] — anything else (malformed input)
    pub fn validate(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let header = jsonwebtoken::decode_header(token)
            .map_err(|e| AuthError::InvalidToken(format!("failed to decode token header: {e}")))?;

        validate_algorithm(&format!("{:?}", header.alg))?;

        let kid = header
            .kid
            .filter(|kid| !kid.is_empty())
            .ok_or_else(|| AuthError::InvalidToken("missing or empty kid in token header".into()))?;

        let decoding_key = {
            let state = self.state.read();
            let Some(key) = state.keys.get(&kid) else {
                return Err(AuthError::UnknownKid { kid });
            };
            DecodingKey::from_secret(&key.secret)
        };

        let mut validation = Validation::new(Algorithm::HS384);
        validation.leeway = CLAIM_LEEWAY.as_secs();
        validation.validate_nbf = true;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);

        let data = jsonwebtoken::decode::<SessionClaims>(token, &decoding_key, &validation)?;
        Ok(data.claims)
    }
}
