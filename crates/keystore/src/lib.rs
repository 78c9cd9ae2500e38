//! Shared secret-record store abstraction for keygate services.
//!
//! This crate provides the [`SecretStore`] trait and related types that the
//! auth middleware and the key rotator use to share JWT signing keys. The
//! store holds named records of opaque byte entries; signing keys live in
//! those records under a timestamped naming convention decoded by the
//! [`keyset`] module.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Rotator (writer)                      │
//! │        generate key → append entry → prune oldest           │
//! ├─────────────────────────────────────────────────────────────┤
//! │                      keygate-keystore                       │
//! │                    SecretStore trait                        │
//! │                  (get, update, watch)                       │
//! ├──────────────────┬──────────────────────────────────────────┤
//! │ MemorySecretStore│        remote backends (external)        │
//! │    (testing)     │                                          │
//! ├──────────────────┴──────────────────────────────────────────┤
//! │                Auth middleware replicas (readers)           │
//! │        watch → parse key set → hot-reload signer            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use keygate_keystore::{MemorySecretStore, SecretRecord, SecretStore, keyset};
//! use zeroize::Zeroizing;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MemorySecretStore::new();
//!
//!     let mut record = SecretRecord::new("auth-keys", "platform");
//!     record
//!         .data
//!         .insert(keyset::signing_key_name(1000), Zeroizing::new(vec![0x41; 48]));
//!     store.create(record).await?;
//!
//!     let record = store.get("auth-keys", "platform").await?;
//!     let keys = keyset::SigningKeySet::parse(&record)?;
//!     assert_eq!(keys.latest_kid, "1000");
//!
//!     Ok(())
//! }
//! ```
//!
//! # Error Handling
//!
//! All operations return [`StoreResult<T>`], which wraps the [`StoreError`]
//! variants of the store contract. Backends map their internal failures to
//! these standardized types.

#![deny(unsafe_code)]

pub mod error;
pub mod keyset;
pub mod memory;
pub mod record;
pub mod store;

// Re-export primary types at crate root for convenience
pub use error::{BoxError, StoreError, StoreResult};
pub use keyset::{SIGNING_KEY_PREFIX, SIGNING_KEY_SIZE, KeysetError, SigningKey, SigningKeySet};
pub use memory::MemorySecretStore;
pub use record::SecretRecord;
pub use store::{SecretEvent, SecretEventKind, SecretStore};
