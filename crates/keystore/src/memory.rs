//! In-memory secret store implementation.
//!
//! This module provides [`MemorySecretStore`], an in-memory implementation
//! of [`SecretStore`] suitable for testing and development.
//!
//! # Features
//!
//! - **Thread-safe**: Uses [`parking_lot::RwLock`] for concurrent access
//! - **Version CAS**: `update` enforces the record version and bumps it on success
//! - **Watch support**: Changes are published on a [`broadcast`] channel
//!
//! # Limitations
//!
//! - Data is not persisted; all data is lost when the process exits
//! - All namespaces share one event channel; consumers filter by target

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::{
    error::{StoreError, StoreResult},
    record::SecretRecord,
    store::{SecretEvent, SecretEventKind, SecretStore},
};

/// Capacity of the watch event channel.
///
/// Watch consumers tolerate lag (events carry full records), so a modest
/// buffer is enough to absorb bursts.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// In-memory implementation of [`SecretStore`] for testing.
///
/// # Cloning
///
/// `MemorySecretStore` is cheaply cloneable via [`Arc`]. All clones share
/// the same records and event channel.
#[derive(Clone)]
pub struct MemorySecretStore {
    /// Records indexed by (namespace, name).
    records: Arc<RwLock<HashMap<(String, String), SecretRecord>>>,
    /// Change notifications for all namespaces.
    events: broadcast::Sender<SecretEvent>,
}

impl MemorySecretStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { records: Arc::new(RwLock::new(HashMap::new())), events }
    }

    /// Creates a record, publishing an [`Added`] event.
    ///
    /// The store assigns version 1 regardless of the version on the input.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] if a record with the same name
    /// already exists in the namespace.
    ///
    /// [`Added`]: SecretEventKind::Added
    #[tracing::instrument(skip(self, record), fields(name = %record.name, namespace = %record.namespace))]
    pub async fn create(&self, mut record: SecretRecord) -> StoreResult<()> {
        let key = (record.namespace.clone(), record.name.clone());
        let mut records = self.records.write();

        if records.contains_key(&key) {
            return Err(StoreError::conflict());
        }

        record.version = 1;
        records.insert(key, record.clone());
        drop(records);

        self.publish(SecretEventKind::Added, record);
        Ok(())
    }

    /// Removes a record, publishing a [`Deleted`] event with its last state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the record doesn't exist.
    ///
    /// [`Deleted`]: SecretEventKind::Deleted
    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, name: &str, namespace: &str) -> StoreResult<()> {
        let key = (namespace.to_owned(), name.to_owned());
        let removed = self.records.write().remove(&key);

        match removed {
            Some(record) => {
                self.publish(SecretEventKind::Deleted, record);
                Ok(())
            },
            None => Err(StoreError::not_found(name, namespace)),
        }
    }

    /// Sends an event, ignoring the absence of subscribers.
    fn publish(&self, kind: SecretEventKind, record: SecretRecord) {
        let _ = self.events.send(SecretEvent { kind, record });
    }
}

impl Default for MemorySecretStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    #[tracing::instrument(skip(self))]
    async fn get(&self, name: &str, namespace: &str) -> StoreResult<SecretRecord> {
        let key = (namespace.to_owned(), name.to_owned());
        let records = self.records.read();
        records.get(&key).cloned().ok_or_else(|| StoreError::not_found(name, namespace))
    }

    #[tracing::instrument(skip(self, record), fields(name = %record.name, namespace = %record.namespace, version = record.version))]
    async fn update(&self, record: &SecretRecord) -> StoreResult<()> {
        let key = (record.namespace.clone(), record.name.clone());
        let mut records = self.records.write();

        let stored = records
            .get_mut(&key)
            .ok_or_else(|| StoreError::not_found(&record.name, &record.namespace))?;

        if stored.version != record.version {
            return Err(StoreError::conflict());
        }

        stored.data = record.data.clone();
        stored.version += 1;
        let updated = stored.clone();
        drop(records);

        self.publish(SecretEventKind::Updated, updated);
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn watch(&self, namespace: &str) -> StoreResult<broadcast::Receiver<SecretEvent>> {
        tracing::debug!(namespace, "new watch subscription");
        Ok(self.events.subscribe())
    }
}
