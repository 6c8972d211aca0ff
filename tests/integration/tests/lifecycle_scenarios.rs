//! End-to-end lifecycle scenarios against the in-memory store.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use secretdrop_core::config::ConfigBuilder;
use secretdrop_core::Config;
use secretdrop_integration_tests::{manager, PASSWORD};
use secretdrop_secrets::{
    CreateRequestParams, LifecyclePolicy, MemoryTtlStore, RequestStatus, RetentionPolicy,
    SecretError, SecretLifecycleManager, SystemKey, TtlStore,
};

fn fast() -> Config {
    ConfigBuilder::new().min_response_ms(0).build()
}

#[tokio::test]
async fn test_single_view_secret_is_gone_after_reading() {
    let (manager, store) = manager(&fast());
    let record = manager
        .create("wifi-pass-123", PASSWORD, RetentionPolicy::ViewLimited(1))
        .await
        .unwrap();

    let retrieved = manager.retrieve(&record.id, PASSWORD).await.unwrap();
    assert_eq!(retrieved.plaintext.expose_secret(), "wifi-pass-123");
    assert_eq!(retrieved.views_remaining, Some(0));
    assert!(store.is_empty());

    assert!(matches!(
        manager.retrieve(&record.id, PASSWORD).await,
        Err(SecretError::NotFound)
    ));
}

#[tokio::test]
async fn test_two_view_secret_counts_down() {
    let (manager, _store) = manager(&fast());
    let record = manager
        .create("deploy token", PASSWORD, RetentionPolicy::ViewLimited(2))
        .await
        .unwrap();

    let first = manager.retrieve(&record.id, PASSWORD).await.unwrap();
    let second = manager.retrieve(&record.id, PASSWORD).await.unwrap();
    assert_eq!(first.views_remaining, Some(1));
    assert_eq!(second.views_remaining, Some(0));
    assert_eq!(second.plaintext.expose_secret(), "deploy token");

    assert!(matches!(
        manager.retrieve(&record.id, PASSWORD).await,
        Err(SecretError::NotFound)
    ));
}

#[tokio::test]
async fn test_time_limited_secret_expires() {
    let config = ConfigBuilder::new().min_response_ms(0).max_ttl_secs(1).build();
    let (manager, store) = manager(&config);
    let record = manager
        .create("short-lived", PASSWORD, RetentionPolicy::TimeLimited(1))
        .await
        .unwrap();

    // Readable, repeatedly, before expiry.
    manager.retrieve(&record.id, PASSWORD).await.unwrap();
    manager.retrieve(&record.id, PASSWORD).await.unwrap();

    tokio::time::sleep(Duration::from_secs(2)).await;

    assert!(matches!(
        manager.retrieve(&record.id, PASSWORD).await,
        Err(SecretError::Expired)
    ));
    assert!(store.is_empty());
    assert!(matches!(
        manager.retrieve(&record.id, PASSWORD).await,
        Err(SecretError::NotFound)
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_retrievals_never_exceed_view_count() {
    let (manager, store) = manager(&fast());
    let record = manager
        .create("contended", PASSWORD, RetentionPolicy::ViewLimited(2))
        .await
        .unwrap();

    let tasks = (0..8).map(|_| {
        let manager = Arc::clone(&manager);
        let id = record.id.clone();
        tokio::spawn(async move { manager.retrieve(&id, PASSWORD).await })
    });

    let mut remaining = Vec::new();
    let mut not_found = 0;
    for result in join_all(tasks).await {
        match result.unwrap() {
            Ok(retrieved) => {
                assert_eq!(retrieved.plaintext.expose_secret(), "contended");
                remaining.push(retrieved.views_remaining);
            }
            Err(SecretError::NotFound) => not_found += 1,
            Err(e) => panic!("unexpected error: {e:?}"),
        }
    }

    remaining.sort();
    assert_eq!(remaining, vec![Some(0), Some(1)]);
    assert_eq!(not_found, 6);
    assert!(store.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_racing_readers_of_single_view_secret() {
    const READERS: usize = 16;
    let (manager, store) = manager(&fast());
    let record = manager
        .create("one reader only", PASSWORD, RetentionPolicy::ViewLimited(1))
        .await
        .unwrap();

    let tasks = (0..READERS).map(|_| {
        let manager = Arc::clone(&manager);
        let id = record.id.clone();
        tokio::spawn(async move { manager.retrieve(&id, PASSWORD).await })
    });

    let mut succeeded = 0;
    let mut not_found = 0;
    for result in join_all(tasks).await {
        match result.unwrap() {
            Ok(retrieved) => {
                assert_eq!(retrieved.views_remaining, Some(0));
                succeeded += 1;
            }
            Err(SecretError::NotFound) => not_found += 1,
            Err(e) => panic!("unexpected error: {e:?}"),
        }
    }

    assert_eq!(succeeded, 1);
    assert_eq!(not_found, READERS - 1);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_wrong_password_and_missing_record_take_the_same_time() {
    const TRIALS: u32 = 10;
    let floor = Duration::from_millis(150);
    let threshold = Duration::from_millis(25);

    let config = ConfigBuilder::new()
        .min_response_ms(floor.as_millis() as u64)
        .build();
    let (manager, _store) = manager(&config);
    let record = manager
        .create("timing", PASSWORD, RetentionPolicy::TimeLimited(1))
        .await
        .unwrap();

    let mut missing = Duration::ZERO;
    let mut wrong = Duration::ZERO;
    for _ in 0..TRIALS {
        let started = Instant::now();
        let err = manager.retrieve("no-such-record", PASSWORD).await.unwrap_err();
        missing += started.elapsed();
        assert!(matches!(err, SecretError::NotFound));

        let started = Instant::now();
        let err = manager.retrieve(&record.id, "Wr0ng!Pass1234").await.unwrap_err();
        wrong += started.elapsed();
        assert!(matches!(err, SecretError::InvalidPassword));
    }

    let (missing, wrong) = (missing / TRIALS, wrong / TRIALS);
    let gap = if missing > wrong { missing - wrong } else { wrong - missing };
    assert!(
        gap < threshold,
        "mean not-found {missing:?} vs invalid-password {wrong:?}"
    );
}

#[tokio::test]
async fn test_failures_take_at_least_the_floor() {
    let floor = Duration::from_millis(200);
    let config = ConfigBuilder::new()
        .min_response_ms(floor.as_millis() as u64)
        .build();
    let (manager, _store) = manager(&config);
    let record = manager
        .create("timed", PASSWORD, RetentionPolicy::ViewLimited(2))
        .await
        .unwrap();

    let started = Instant::now();
    assert!(matches!(
        manager.retrieve("no-such-record", PASSWORD).await,
        Err(SecretError::NotFound)
    ));
    assert!(started.elapsed() >= floor);

    let started = Instant::now();
    assert!(matches!(
        manager.retrieve(&record.id, "Wr0ng!Pass1234").await,
        Err(SecretError::InvalidPassword)
    ));
    assert!(started.elapsed() >= floor);

    let started = Instant::now();
    manager.retrieve(&record.id, PASSWORD).await.unwrap();
    assert!(started.elapsed() >= floor);
}

#[tokio::test]
async fn test_tampered_ciphertext_reports_generic_failure() {
    let (manager, store) = manager(&fast());
    let record = manager
        .create("integrity", PASSWORD, RetentionPolicy::TimeLimited(1))
        .await
        .unwrap();

    let key = format!("retrieval:{}", record.id);
    let raw = store.get(&key).await.unwrap().unwrap();
    let mut doc: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    let envelope = doc["envelope"].as_str().unwrap().to_string();
    let (head, last) = envelope.split_at(envelope.len() - 1);
    let flipped = if last == "f" { "e" } else { "f" };
    doc["envelope"] = serde_json::Value::String(format!("{head}{flipped}"));
    store
        .set(&key, serde_json::to_vec(&doc).unwrap(), Duration::from_secs(60))
        .await
        .unwrap();

    let err = manager.retrieve(&record.id, PASSWORD).await.unwrap_err();
    assert!(matches!(err, SecretError::Decryption));
    assert_eq!(err.to_string(), "Unable to decrypt secret");
}

#[tokio::test]
async fn test_other_system_key_cannot_decrypt() {
    let config = fast();
    let store = Arc::new(MemoryTtlStore::new());
    let policy = LifecyclePolicy::from_config(&config).unwrap();
    let writer = SecretLifecycleManager::new(store.clone(), SystemKey::generate(), policy.clone());
    let reader = SecretLifecycleManager::new(store.clone(), SystemKey::generate(), policy);

    let record = writer
        .create("bound to its key", PASSWORD, RetentionPolicy::ViewLimited(1))
        .await
        .unwrap();

    assert!(matches!(
        reader.retrieve(&record.id, PASSWORD).await,
        Err(SecretError::Decryption)
    ));
    // The failed read did not consume the only view.
    let retrieved = writer.retrieve(&record.id, PASSWORD).await.unwrap();
    assert_eq!(retrieved.plaintext.expose_secret(), "bound to its key");
}

#[tokio::test]
async fn test_unresponsive_store_is_retryable() {
    let config = ConfigBuilder::new()
        .min_response_ms(0)
        .store_timeout_ms(50)
        .build();
    let store = Arc::new(MemoryTtlStore::with_latency(Duration::from_millis(500)));
    let manager = SecretLifecycleManager::new(
        store,
        SystemKey::generate(),
        LifecyclePolicy::from_config(&config).unwrap(),
    );

    let err = manager
        .create("never stored", PASSWORD, RetentionPolicy::ViewLimited(1))
        .await
        .unwrap_err();
    assert!(err.is_retryable(), "got {err:?}");

    let err = manager.retrieve("any-id", PASSWORD).await.unwrap_err();
    assert!(err.is_retryable(), "got {err:?}");
}

#[tokio::test]
async fn test_request_is_fulfilled_then_retrieved() {
    let config = ConfigBuilder::new()
        .min_response_ms(0)
        .base_url("https://secrets.example.com")
        .build();
    let (manager, _store) = manager(&config);

    let request = manager
        .create_request(CreateRequestParams {
            requestor: "alice@example.com".to_string(),
            description: "Production API key".to_string(),
            retention: RetentionPolicy::ViewLimited(1),
        })
        .await
        .unwrap();

    let submission = manager
        .submit(&request.id, "sk-live-abc123", PASSWORD)
        .await
        .unwrap();
    assert!(submission
        .retrieval_url
        .starts_with("https://secrets.example.com/retrieve/"));
    assert!(submission.retrieval_url.ends_with(&submission.record.id));

    let status = manager.status(&submission.record.id).await.unwrap();
    assert_eq!(status.views_remaining, Some(1));

    let retrieved = manager
        .retrieve(&submission.record.id, PASSWORD)
        .await
        .unwrap();
    assert_eq!(retrieved.plaintext.expose_secret(), "sk-live-abc123");

    let request = manager.get_request(&request.id).await.unwrap();
    assert_eq!(request.status, RequestStatus::Fulfilled);
    assert!(matches!(
        manager.submit(&request.id, "again", PASSWORD).await,
        Err(SecretError::Validation(_))
    ));
}

#[tokio::test]
async fn test_missing_system_key_fails_at_startup() {
    let config = Config::default();
    if std::env::var("SECRETDROP_SYSTEM_KEY").is_ok() {
        return;
    }
    let err = SecretLifecycleManager::from_config(Arc::new(MemoryTtlStore::new()), &config)
        .unwrap_err();
    assert!(matches!(err, SecretError::Configuration(_)));
}
