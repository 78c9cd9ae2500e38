//! # keygate Rotator
//!
//! One-shot JWT signing key rotation over a [`SecretStore`] record.
//!
//! An external scheduler invokes [`rotate`] every rotation interval. Each
//! run generates a fresh 48-byte HMAC key, appends it to the record under
//! the timestamped naming convention, prunes the oldest keys beyond the
//! retention count, and persists the record in one optimistic update. The
//! auth middleware replicas pick the change up through their store watch.
//!
//! The rotator is the sole writer of the record; at most one instance runs
//! at a time (enforced by the scheduler). A lost update race with an
//! out-of-band writer surfaces as
//! [`StoreError::Conflict`](keygate_keystore::StoreError::Conflict) and is
//! left to the next scheduled run — there is no internal retry.
//!
//! ## Example
//!
//! ```no_run
//! use keygate_keystore::MemorySecretStore;
//! use keygate_rotator::rotate;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemorySecretStore::new();
//! rotate(&store, "auth-keys", "platform", 6).await?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Rotation error types.
pub mod error;
/// Rotation operations.
pub mod rotate;

pub use error::RotateError;
pub use rotate::{generate_key, latest_key_id, rotate, validate};
