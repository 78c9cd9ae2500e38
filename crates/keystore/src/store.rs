//! Store trait for secret-record operations.
//!
//! This module provides the [`SecretStore`] trait that abstracts the shared
//! key store consumed by the auth middleware (reader) and the rotator
//! (writer). Implementations can use different backends (a cluster secret
//! store in production, in-memory for testing).
//!
//! # Write Topology
//!
//! The rotator is the sole writer; middleware replicas only read and watch.
//! Read-modify-write cycles rely on the record version carried by
//! [`SecretRecord`](crate::SecretRecord) — the store rejects updates whose
//! version is stale with [`StoreError::Conflict`].
//!
//! # Watch Semantics
//!
//! [`watch`](SecretStore::watch) returns a broadcast receiver of
//! [`SecretEvent`]s for a namespace. Delivery is at-least-once: reconnects
//! and lagged receivers may observe re-delivery or gaps, and every event
//! carries the full record, so consumers must apply events idempotently and
//! may safely resume from the next event after a gap. Consumers filter to
//! their exact `(name, namespace)` target.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::{error::StoreResult, record::SecretRecord};

/// Kind of change delivered on a watch stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretEventKind {
    /// The record was created (also delivered for the initial snapshot).
    Added,
    /// The record was updated in place.
    Updated,
    /// The record was deleted.
    Deleted,
}

/// A single change notification for a secret record.
///
/// `record` is the full record after the change; for [`Deleted`] events it
/// is the last stored state.
///
/// [`Deleted`]: SecretEventKind::Deleted
#[derive(Debug, Clone)]
pub struct SecretEvent {
    /// What happened to the record.
    pub kind: SecretEventKind,
    /// The affected record.
    pub record: SecretRecord,
}

/// Persistence layer for secret records.
///
/// Abstracts record storage so production backends and the in-memory test
/// store share the same interface.
///
/// # Error Handling
///
/// Operations return [`StoreResult`] with the standardized
/// [`StoreError`](crate::StoreError) variants. Implementations should not
/// retry internally; transient-failure policy belongs to the caller (the
/// rotator's external scheduler re-runs it on its cadence).
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Retrieves a record by name and namespace.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the record doesn't exist
    /// - [`StoreError::Forbidden`] if the caller may not read it
    /// - [`StoreError::Connection`] / [`StoreError::Timeout`] on transport failures
    ///
    /// [`StoreError::NotFound`]: crate::StoreError::NotFound
    /// [`StoreError::Forbidden`]: crate::StoreError::Forbidden
    /// [`StoreError::Connection`]: crate::StoreError::Connection
    /// [`StoreError::Timeout`]: crate::StoreError::Timeout
    #[must_use = "store operations may fail and errors must be handled"]
    async fn get(&self, name: &str, namespace: &str) -> StoreResult<SecretRecord>;

    /// Persists a modified record.
    ///
    /// The record's `version` must match the currently stored version;
    /// otherwise the update is rejected with
    /// [`StoreError::Conflict`](crate::StoreError::Conflict) and the caller
    /// must re-read before retrying.
    #[must_use = "update may fail with a conflict and errors must be handled"]
    async fn update(&self, record: &SecretRecord) -> StoreResult<()>;

    /// Subscribes to change notifications for a namespace.
    ///
    /// The returned receiver yields [`SecretEvent`]s in the order the store
    /// observed them. Consumers filter by record name.
    async fn watch(&self, namespace: &str) -> StoreResult<broadcast::Receiver<SecretEvent>>;
}
