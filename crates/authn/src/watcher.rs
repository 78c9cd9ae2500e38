//! Store watcher driving signer key reloads.
//!
//! [`SecretWatcher`] bridges the key store's watch stream and one
//! [`HmacSigner`]: it loads the initial key set at startup (blocking) and
//! applies every subsequent change to the signer.
//!
//! # Failure Policy
//!
//! Startup is strict — a record that cannot be fetched or parsed means the
//! process must not serve traffic, so [`load_initial`] propagates every
//! failure. Steady state is lenient — a malformed update or a deletion is
//! logged and skipped, and the signer keeps its previous key set; recovery
//! is expected from a later event. The watcher never crashes the process
//! for stream-level anomalies.
//!
//! [`load_initial`]: SecretWatcher::load_initial

use std::sync::Arc;

use keygate_keystore::{SecretEvent, SecretEventKind, SecretRecord, SecretStore, SigningKeySet};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::{error::AuthError, signer::HmacSigner};

/// Applies key-store changes for one `(name, namespace)` record to a signer.
///
/// Holds the signer; the signer has no reference back.
pub struct SecretWatcher {
    signer: Arc<HmacSigner>,
    store: Arc<dyn SecretStore>,
    secret_name: String,
    namespace: String,
}

impl SecretWatcher {
    /// Creates a watcher for the given record target.
    #[must_use]
    pub fn new(
        signer: Arc<HmacSigner>,
        store: Arc<dyn SecretStore>,
        secret_name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self { signer, store, secret_name: secret_name.into(), namespace: namespace.into() }
    }

    /// Subscribes, loads the initial key set, and spawns the event loop.
    ///
    /// The subscription is taken *before* the initial load, so a rotation
    /// landing between the two is delivered rather than missed. Returns
    /// once the signer holds a valid key set; the caller may start serving
    /// traffic from that point.
    ///
    /// # Errors
    ///
    /// Propagates subscription and [`load_initial`](Self::load_initial)
    /// failures; the process must not serve without an initial key set.
    pub async fn start(
        self: Arc<Self>,
    ) -> Result<tokio::task::JoinHandle<Result<(), AuthError>>, AuthError> {
        let events = self.store.watch(&self.namespace).await?;
        self.load_initial().await?;
        Ok(tokio::spawn(async move { self.consume(events).await }))
    }

    /// Loads the initial key set into the signer.
    ///
    /// Must complete before the process accepts requests; until then the
    /// signer holds no keys and every `generate` fails.
    ///
    /// # Errors
    ///
    /// Propagates store failures, parse failures (a record with no signing
    /// keys is fatal here), and update precondition failures.
    pub async fn load_initial(&self) -> Result<(), AuthError> {
        let record = self.store.get(&self.secret_name, &self.namespace).await?;
        let set = SigningKeySet::parse(&record)?;

        tracing::info!(
            secret = %self.secret_name,
            namespace = %self.namespace,
            key_count = set.len(),
            latest_kid = %set.latest_kid,
            "loaded initial signing keys"
        );

        self.signer.update_keys(set)?;
        Ok(())
    }

    /// Consumes the watch stream until it closes.
    ///
    /// Prefer [`start`](Self::start), which closes the gap between the
    /// initial load and the subscription. Returns `Ok(())` when the stream
    /// closes; the store client owns reconnect/backoff, so a close here
    /// means the store handle is gone.
    ///
    /// # Errors
    ///
    /// Fails only if the watch subscription itself cannot be established.
    pub async fn run(&self) -> Result<(), AuthError> {
        let events = self.store.watch(&self.namespace).await?;
        self.consume(events).await
    }

    /// Applies events until the stream closes.
    async fn consume(
        &self,
        mut events: broadcast::Receiver<SecretEvent>,
    ) -> Result<(), AuthError> {
        loop {
            match events.recv().await {
                Ok(event) => self.handle_event(event),
                Err(RecvError::Lagged(skipped)) => {
                    // Events carry the full record; the next one re-syncs us.
                    tracing::warn!(skipped, "secret watch lagged, continuing with next event");
                },
                Err(RecvError::Closed) => {
                    tracing::info!(
                        secret = %self.secret_name,
                        namespace = %self.namespace,
                        "secret watch stream closed"
                    );
                    return Ok(());
                },
            }
        }
    }

    /// Dispatches one event, filtered to the watched record.
    fn handle_event(&self, event: SecretEvent) {
        if event.record.name != self.secret_name || event.record.namespace != self.namespace {
            return;
        }

        match event.kind {
            // The initial snapshot may deliver adds; treat them as updates.
            SecretEventKind::Added | SecretEventKind::Updated => self.apply_record(&event.record),
            SecretEventKind::Deleted => {
                // No compensating action: the record may be recreated, and
                // we'll receive an Added event then.
                tracing::error!(
                    secret = %self.secret_name,
                    namespace = %self.namespace,
                    "signing key secret was deleted, keeping current keys until it is recreated"
                );
            },
        }
    }

    /// Parses a record and applies it to the signer.
    ///
    /// Failures leave the signer's previous key set in place.
    fn apply_record(&self, record: &SecretRecord) {
        let set = match SigningKeySet::parse(record) {
            Ok(set) => set,
            Err(err) => {
                tracing::warn!(
                    secret = %self.secret_name,
                    namespace = %self.namespace,
                    error = %err,
                    "ignoring malformed signing key update, keeping current keys"
                );
                return;
            },
        };

        let key_count = set.len();
        let latest_kid = set.latest_kid.clone();

        if let Err(err) = self.signer.update_keys(set) {
            tracing::warn!(error = %err, "failed to apply signing key update");
            return;
        }

        tracing::info!(key_count, latest_kid = %latest_kid, "updated signing keys from secret");
    }
}
