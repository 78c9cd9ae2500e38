//! # keygate Authentication
//!
//! JWT issuance and validation for keygate's auth middleware.
//!
//! This crate provides:
//! - **Token signing**: Multi-key HMAC-SHA384 signing with a cool-off policy
//! - **Token validation**: Algorithm-pinned verification by key ID
//! - **Hot key reload**: A store watcher that applies key rotations without restarts
//! - **Configuration**: Startup validation of the retention/expiration inequality
//!
//! # Key Rotation Model
//!
//! ```text
//! Rotator ──writes──▶ SecretStore ──watch──▶ SecretWatcher ──updates──▶ HmacSigner
//!                                                                          │
//!                                                        sign / validate ──┘
//! ```
//!
//! Many stateless middleware replicas each hold an [`HmacSigner`] fed from
//! the same store record. A freshly rotated key is visible for verification
//! immediately but must not sign until every replica has had time to observe
//! it — the signer refuses to sign with a key younger (locally) than the
//! configured cool-off, so tokens never arrive at a replica that cannot
//! verify them.
//!
//! ## Example
//!
//! ```no_run
//! use std::{sync::Arc, time::Duration};
//!
//! use keygate_authn::{HmacSigner, SecretWatcher, TokenRequest};
//! use keygate_keystore::MemorySecretStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let signer = Arc::new(HmacSigner::new(
//!     "https://auth.example.com",
//!     "example-platform",
//!     Duration::from_secs(3600),
//!     Duration::from_secs(30),
//! ));
//!
//! let store = Arc::new(MemorySecretStore::new());
//! let watcher = Arc::new(SecretWatcher::new(signer.clone(), store, "auth-keys", "platform"));
//!
//! // Subscribes, loads the initial keys (blocking — the process must not
//! // serve before this returns), then applies rotations in the background.
//! watcher.start().await?;
//!
//! let token = signer.generate(
//!     &TokenRequest::builder().subject("alice").groups(vec!["admins".into()]).build(),
//! )?;
//! let claims = signer.validate(&token)?;
//! assert_eq!(claims.sub, "alice");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Session claims and token request types.
pub mod claims;
/// Configuration and startup validation.
pub mod config;
/// Authentication error types.
pub mod error;
/// Multi-key HMAC signer.
pub mod signer;
/// Algorithm pinning.
pub mod validation;
/// Store watcher driving signer key reloads.
pub mod watcher;

#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used)]
pub mod testutil;

// Re-export key types for convenience
pub use claims::{SessionClaims, TOKEN_TYPE_SESSION, TokenRequest};
pub use config::{AuthConfig, ConfigError};
pub use error::{AuthError, Result};
pub use signer::HmacSigner;
pub use validation::{ACCEPTED_ALGORITHMS, validate_algorithm};
pub use watcher::SecretWatcher;
