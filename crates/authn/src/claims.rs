//! Session token claims.
//!
//! This module defines the claim set carried by keygate session tokens.
//!
//! # Wire Format
//!
//! Tokens use JWS compact serialization with an HS384 header carrying the
//! signing key ID:
//!
//! ```json
//! {"alg":"HS384","typ":"JWT","kid":"1700000000"}
//! ```
//!
//! The payload carries the registered claims plus the platform's identity
//! claims:
//!
//! ```json
//! {
//!   "iss": "https://auth.example.com",
//!   "aud": ["example-platform"],
//!   "sub": "alice",
//!   "exp": 1700003600,
//!   "iat": 1700000000,
//!   "nbf": 1700000000,
//!   "user": "alice",
//!   "groups": ["admins"],
//!   "uid": "u-1234",
//!   "extra": {"dept": ["eng"]},
//!   "path": "/workspaces/alice",
//!   "domain": "example.com",
//!   "tokenType": "session",
//!   "skipRefresh": false
//! }
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Token type for interactive sessions.
pub const TOKEN_TYPE_SESSION: &str = "session";

/// Claims carried by a session token.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Issuer.
    pub iss: String,
    /// Audience (single-element array).
    pub aud: Vec<String>,
    /// Subject — the authenticated username.
    pub sub: String,
    /// Expiration time (seconds since epoch).
    pub exp: u64,
    /// Issued at (seconds since epoch).
    pub iat: u64,
    /// Not before (seconds since epoch).
    pub nbf: u64,
    /// Username (mirrors `sub`).
    pub user: String,
    /// Group memberships.
    #[serde(default)]
    pub groups: Vec<String>,
    /// Stable user identifier.
    pub uid: String,
    /// Additional identity attributes; omitted when empty.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, Vec<String>>,
    /// Path scope the token is valid for.
    pub path: String,
    /// Cookie/requests domain the token is scoped to.
    pub domain: String,
    /// Token type (e.g. [`TOKEN_TYPE_SESSION`]).
    #[serde(rename = "tokenType")]
    pub token_type: String,
    /// Whether the refresh flow should skip this token.
    ///
    /// Always `false` at issuance; the refresh handler flips it on
    /// re-issued tokens to stop refresh loops.
    #[serde(rename = "skipRefresh")]
    pub skip_refresh: bool,
}

/// Inputs for issuing one session token.
///
/// # Example
///
/// ```
/// use keygate_authn::TokenRequest;
///
/// let request = TokenRequest::builder()
///     .subject("alice")
///     .groups(vec!["admins".into()])
///     .uid("u-1234")
///     .path("/workspaces/alice")
///     .domain("example.com")
///     .build();
///
/// assert_eq!(request.token_type, "session");
/// ```
#[derive(Clone, Debug, bon::Builder)]
pub struct TokenRequest {
    /// Authenticated username; becomes both `sub` and `user`.
    #[builder(into)]
    pub subject: String,

    /// Group memberships.
    #[builder(default)]
    pub groups: Vec<String>,

    /// Stable user identifier.
    #[builder(into, default)]
    pub uid: String,

    /// Additional identity attributes.
    #[builder(default)]
    pub extra: HashMap<String, Vec<String>>,

    /// Path scope.
    #[builder(into, default)]
    pub path: String,

    /// Domain scope.
    #[builder(into, default)]
    pub domain: String,

    /// Token type.
    #[builder(into, default = TOKEN_TYPE_SESSION.to_owned())]
    pub token_type: String,
}
