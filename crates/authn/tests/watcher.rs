//! Watcher integration tests: initial load, hot reload from store events,
//! malformed-update and deletion tolerance.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::{sync::Arc, time::Duration};

use keygate_authn::{
    AuthError, HmacSigner, SecretWatcher, TokenRequest,
    testutil::{seed_record, test_secret},
};
use keygate_keystore::{KeysetError, MemorySecretStore, SecretRecord, SecretStore, StoreError};
use zeroize::Zeroizing;

const SECRET_NAME: &str = "auth-keys";
const NAMESPACE: &str = "platform";
const HOUR: Duration = Duration::from_secs(3600);

/// Signer + store + running watcher over a seeded record.
async fn start_middleware(
    keys: &[(i64, u8)],
    cool_off: Duration,
) -> (Arc<HmacSigner>, Arc<MemorySecretStore>) {
    let store = Arc::new(MemorySecretStore::new());
    store.create(seed_record(SECRET_NAME, NAMESPACE, keys)).await.expect("seed record");

    let signer = Arc::new(HmacSigner::new("test-issuer", "test-audience", HOUR, cool_off));
    let watcher = Arc::new(SecretWatcher::new(
        signer.clone(),
        store.clone() as Arc<dyn SecretStore>,
        SECRET_NAME,
        NAMESPACE,
    ));
    watcher.start().await.expect("start watcher");

    (signer, store)
}

fn sample_request() -> TokenRequest {
    TokenRequest::builder().subject("alice").uid("u-1").build()
}

/// Kid currently chosen by `generate`, or None while no key is usable.
fn current_kid(signer: &HmacSigner) -> Option<String> {
    let token = signer.generate(&sample_request()).ok()?;
    jsonwebtoken::decode_header(&token).expect("decode header").kid
}

/// Polls `condition` until it holds or a 2 s deadline passes.
async fn wait_for(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "timed out waiting for {what}");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

// ---------------------------------------------------------------------------
// Startup
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_fresh_deploy_signs_after_cool_off() {
    // A replica starting against a one-key store may not sign until the
    // key's local cool-off elapses, then signs with that key.
    let cool_off = Duration::from_millis(200);
    let (signer, _store) = start_middleware(&[(1000, b'A')], cool_off).await;

    assert!(matches!(
        signer.generate(&sample_request()),
        Err(AuthError::NoUsableKey { .. })
    ));

    tokio::time::sleep(cool_off + Duration::from_millis(50)).await;

    let token = signer.generate(&sample_request()).expect("generate after cool-off");
    let kid = jsonwebtoken::decode_header(&token).expect("header").kid;
    assert_eq!(kid.as_deref(), Some("1000"));
    assert!(signer.validate(&token).is_ok());
}

#[tokio::test]
async fn test_load_initial_fails_on_missing_record() {
    let store = Arc::new(MemorySecretStore::new());
    let signer = Arc::new(HmacSigner::new("test-issuer", "test-audience", HOUR, Duration::ZERO));
    let watcher =
        SecretWatcher::new(signer, store as Arc<dyn SecretStore>, SECRET_NAME, NAMESPACE);

    let result = watcher.load_initial().await;

    assert!(matches!(result, Err(AuthError::Store(StoreError::NotFound { .. }))));
}

#[tokio::test]
async fn test_load_initial_fails_on_record_without_keys() {
    let store = Arc::new(MemorySecretStore::new());
    let mut record = SecretRecord::new(SECRET_NAME, NAMESPACE);
    record.data.insert("tls.crt".to_owned(), Zeroizing::new(b"certificate".to_vec()));
    store.create(record).await.expect("seed record");

    let signer = Arc::new(HmacSigner::new("test-issuer", "test-audience", HOUR, Duration::ZERO));
    let watcher =
        SecretWatcher::new(signer, store as Arc<dyn SecretStore>, SECRET_NAME, NAMESPACE);

    let result = watcher.load_initial().await;

    assert!(matches!(result, Err(AuthError::Keyset(KeysetError::NoKeys))));
}

// ---------------------------------------------------------------------------
// Steady state
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_update_event_hot_reloads_keys() {
    let (signer, store) = start_middleware(&[(1000, b'A')], Duration::ZERO).await;
    assert_eq!(current_kid(&signer).as_deref(), Some("1000"));

    // Rotation appends key 2000.
    let mut record = store.get(SECRET_NAME, NAMESPACE).await.expect("get");
    record.data.insert("jwt-signing-key-2000".to_owned(), test_secret(b'B'));
    store.update(&record).await.expect("update");

    wait_for("watcher to apply key 2000", || current_kid(&signer).as_deref() == Some("2000"))
        .await;
}

#[tokio::test]
async fn test_old_tokens_survive_rotation_until_pruned() {
    let (signer, store) = start_middleware(&[(1000, b'A')], Duration::ZERO).await;
    let old_token = signer.generate(&sample_request()).expect("generate");

    // Rotation appends 2000, retaining 1000.
    let mut record = store.get(SECRET_NAME, NAMESPACE).await.expect("get");
    record.data.insert("jwt-signing-key-2000".to_owned(), test_secret(b'B'));
    store.update(&record).await.expect("update");
    wait_for("rotation applied", || current_kid(&signer).as_deref() == Some("2000")).await;

    assert!(signer.validate(&old_token).is_ok(), "retained key must keep old tokens valid");

    // A later rotation prunes 1000.
    let mut record = store.get(SECRET_NAME, NAMESPACE).await.expect("get");
    record.data.remove("jwt-signing-key-1000");
    record.data.insert("jwt-signing-key-3000".to_owned(), test_secret(b'C'));
    store.update(&record).await.expect("update");
    wait_for("prune applied", || current_kid(&signer).as_deref() == Some("3000")).await;

    let result = signer.validate(&old_token);
    assert!(matches!(result, Err(AuthError::UnknownKid { ref kid }) if kid == "1000"));
}

#[tokio::test]
async fn test_malformed_update_keeps_previous_key_set() {
    let (signer, store) = start_middleware(&[(1000, b'A')], Duration::ZERO).await;
    let old_token = signer.generate(&sample_request()).expect("generate");

    // A corrupted write: one well-formed key plus a prefixed entry whose
    // suffix is not a timestamp. The parse fails and the signer must keep
    // the prior key set.
    let mut record = store.get(SECRET_NAME, NAMESPACE).await.expect("get");
    record.data.insert("jwt-signing-key-2000".to_owned(), test_secret(b'B'));
    record
        .data
        .insert("jwt-signing-key-notanumber".to_owned(), Zeroizing::new(b"0123456789".to_vec()));
    store.update(&record).await.expect("update");

    // Give the watcher time to (not) apply it.
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(current_kid(&signer).as_deref(), Some("1000"), "malformed update must be skipped");
    assert!(signer.validate(&old_token).is_ok());

    // A subsequent clean write recovers.
    let mut record = store.get(SECRET_NAME, NAMESPACE).await.expect("get");
    record.data.remove("jwt-signing-key-notanumber");
    store.update(&record).await.expect("update");

    wait_for("clean update applied", || current_kid(&signer).as_deref() == Some("2000")).await;
}

#[tokio::test]
async fn test_deletion_retains_keys_until_recreated() {
    let (signer, store) = start_middleware(&[(1000, b'A')], Duration::ZERO).await;
    let old_token = signer.generate(&sample_request()).expect("generate");

    store.remove(SECRET_NAME, NAMESPACE).await.expect("remove");
    tokio::time::sleep(Duration::from_millis(100)).await;

    // No compensating action: signing and verification continue.
    assert_eq!(current_kid(&signer).as_deref(), Some("1000"));
    assert!(signer.validate(&old_token).is_ok());

    // Recreation delivers an Added event and the new set applies.
    store.create(seed_record(SECRET_NAME, NAMESPACE, &[(2000, b'B')])).await.expect("recreate");
    wait_for("recreated record applied", || current_kid(&signer).as_deref() == Some("2000"))
        .await;
}

#[tokio::test]
async fn test_burst_of_rotations_converges_to_latest() {
    // Re-delivery and gaps are both legal on the watch stream; every event
    // carries the full record, so the signer must converge on the last
    // written state no matter how the burst is delivered.
    let (signer, store) = start_middleware(&[(1000, b'A')], Duration::ZERO).await;

    for timestamp in 2000..2080i64 {
        let mut record = store.get(SECRET_NAME, NAMESPACE).await.expect("get");
        record
            .data
            .insert(format!("jwt-signing-key-{timestamp}"), test_secret(b'B'));
        store.update(&record).await.expect("update");
    }

    wait_for("signer converged on newest key", || {
        current_kid(&signer).as_deref() == Some("2079")
    })
    .await;
}

#[tokio::test]
async fn test_events_for_other_records_are_ignored() {
    let (signer, store) = start_middleware(&[(1000, b'A')], Duration::ZERO).await;

    // Another record in the same namespace rotates; our signer must not
    // pick up its keys.
    store.create(seed_record("other-keys", NAMESPACE, &[(3000, b'C')])).await.expect("create");
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(current_kid(&signer).as_deref(), Some("1000"));

    // A token signed under the other record's key is unknown here.
    let other_signer =
        Arc::new(HmacSigner::new("test-issuer", "test-audience", HOUR, Duration::ZERO));
    let other_watcher = SecretWatcher::new(
        other_signer.clone(),
        store.clone() as Arc<dyn SecretStore>,
        "other-keys",
        NAMESPACE,
    );
    other_watcher.load_initial().await.expect("load other");

    let other_token = other_signer.generate(&sample_request()).expect("generate other");
    let result = signer.validate(&other_token);
    assert!(matches!(result, Err(AuthError::UnknownKid { ref kid }) if kid == "3000"));
}
