//! Integration Tests for the Public Cache API
//!
//! Exercises instances end to end: store operations, TTL, memoization and
//! the background sweeper.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tree_cache::{create_instance, default_instance, CacheConfig, CacheError, CacheInstance, UseOptions};

// == Helper Functions ==

fn create_test_cache() -> CacheInstance {
    create_instance(CacheConfig::default())
}

async fn counted(calls: Arc<AtomicUsize>, value: Value) -> anyhow::Result<Value> {
    calls.fetch_add(1, Ordering::SeqCst);
    Ok(value)
}

// == Store Operations ==

#[tokio::test]
async fn test_set_without_ttl_persists() {
    let cache = create_test_cache();

    cache.set("k", json!({"n": 1}), None).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(cache.get("k").await, Some(json!({"n": 1})));
}

#[tokio::test]
async fn test_nested_key_is_not_a_value_at_its_prefix() {
    let cache = create_test_cache();

    cache.set(["a", "b"], 5, None).await.unwrap();

    assert_eq!(cache.get(["a", "b"]).await, Some(json!(5)));
    assert_eq!(cache.get("a").await, None);
}

#[tokio::test]
async fn test_delete_nonexistent_returns_none() {
    let cache = create_test_cache();

    assert_eq!(cache.delete("missing").await.unwrap(), None);
    assert_eq!(cache.delete(["deep", "missing"]).await.unwrap(), None);
}

#[tokio::test]
async fn test_delete_all_forgets_everything() {
    let cache = create_test_cache();
    cache.set("one", 1, None).await.unwrap();
    cache.set(["two", "nested"], 2, Some(Duration::from_secs(60))).await.unwrap();

    cache.delete_all().await;

    assert_eq!(cache.get("one").await, None);
    assert_eq!(cache.get(["two", "nested"]).await, None);
    assert!(cache.is_empty().await);
}

#[tokio::test]
async fn test_delete_group_removes_subtree() {
    let cache = create_test_cache();
    cache.set(["characters", "page_1"], 1, None).await.unwrap();
    cache.set(["characters", "page_2"], 2, None).await.unwrap();
    cache.set("unrelated", 3, None).await.unwrap();

    assert_eq!(cache.delete_group("characters").await.unwrap(), 2);
    assert_eq!(cache.get(["characters", "page_1"]).await, None);
    assert_eq!(cache.get("unrelated").await, Some(json!(3)));
}

// == TTL ==

#[tokio::test(start_paused = true)]
async fn test_ttl_boundary() {
    let cache = create_test_cache();
    cache.set("k", "v", Some(Duration::from_millis(1000))).await.unwrap();

    tokio::time::advance(Duration::from_millis(999)).await;
    assert_eq!(cache.get("k").await, Some(json!("v")));

    tokio::time::advance(Duration::from_millis(2)).await;
    assert_eq!(cache.get("k").await, None);
}

#[tokio::test]
async fn test_set_until_absolute_expiry() {
    let cache = create_test_cache();

    cache
        .set_until("past", 1, chrono::Utc::now() - chrono::Duration::seconds(1))
        .await
        .unwrap();
    cache
        .set_until("future", 2, chrono::Utc::now() + chrono::Duration::hours(1))
        .await
        .unwrap();

    assert_eq!(cache.get("past").await, None);
    assert_eq!(cache.get("future").await, Some(json!(2)));
}

// == Memoization ==

#[tokio::test]
async fn test_get_or_compute_runs_producer_once() {
    let cache = create_test_cache();
    let calls = Arc::new(AtomicUsize::new(0));

    let first = cache
        .get_or_compute("user", || counted(calls.clone(), json!("ann")), UseOptions::new())
        .await
        .unwrap();
    let second = cache
        .get_or_compute("user", || counted(calls.clone(), json!("bob")), UseOptions::new())
        .await
        .unwrap();

    assert_eq!(first, json!("ann"));
    assert_eq!(second, json!("ann"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_get_or_compute_after_delete_recomputes() {
    let cache = create_test_cache();
    let calls = Arc::new(AtomicUsize::new(0));

    cache
        .get_or_compute("first", || counted(calls.clone(), json!(1)), UseOptions::new())
        .await
        .unwrap();
    cache.delete("first").await.unwrap();
    let value = cache
        .get_or_compute(
            "first",
            || counted(calls.clone(), json!(2)),
            UseOptions::new().ttl(Duration::from_secs(10)),
        )
        .await
        .unwrap();

    assert_eq!(value, json!(2));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_get_or_compute_extraction_path() {
    let cache = create_test_cache();

    let value = cache
        .get_or_compute(
            "k",
            || async { Ok::<_, anyhow::Error>(json!({"a": {"b": 42}})) },
            UseOptions::new().path("a.b"),
        )
        .await
        .unwrap();

    assert_eq!(value, json!(42));
    assert_eq!(cache.get("k").await, Some(json!(42)));
}

#[tokio::test]
async fn test_get_or_compute_condition_false_leaves_store_untouched() {
    let cache = create_test_cache();

    let value = cache
        .get_or_compute(
            "k",
            || async { Ok::<_, anyhow::Error>(json!({"ok": false})) },
            UseOptions::new().condition(|result| (result["ok"] == true).into()),
        )
        .await
        .unwrap();

    assert_eq!(value, json!({"ok": false}));
    assert_eq!(cache.get("k").await, None);
    assert!(cache.is_empty().await);
}

#[tokio::test]
async fn test_get_or_compute_typed_producer() {
    #[derive(serde::Serialize)]
    struct Person {
        name: &'static str,
        age: u32,
    }

    let cache = create_test_cache();
    let value = cache
        .get_or_compute(
            ["people", "pepe"],
            || async { Ok::<_, CacheError>(Person { name: "Pepe", age: 123 }) },
            UseOptions::new().path("name"),
        )
        .await
        .unwrap();

    assert_eq!(value, json!("Pepe"));
}

#[tokio::test]
async fn test_concurrent_misses_are_not_coalesced() {
    let cache = create_test_cache();
    let calls = Arc::new(AtomicUsize::new(0));

    let slow = |calls: Arc<AtomicUsize>| async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        counted(calls, json!("v")).await
    };

    let (a, b) = tokio::join!(
        cache.get_or_compute("k", || slow(calls.clone()), UseOptions::new()),
        cache.get_or_compute("k", || slow(calls.clone()), UseOptions::new()),
    );

    assert_eq!(a.unwrap(), json!("v"));
    assert_eq!(b.unwrap(), json!("v"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

// == Sweeper ==

#[tokio::test(start_paused = true)]
async fn test_sweeper_reclaims_expired_entries() {
    let cache = create_instance(CacheConfig::default().with_sweep_interval_ms(200));
    cache.set(["sessions", "a"], 1, Some(Duration::from_millis(300))).await.unwrap();
    cache.set(["sessions", "b"], 2, None).await.unwrap();

    cache.start_sweeper().await.unwrap();
    tokio::time::sleep(Duration::from_millis(450)).await;

    // Counted without going through get, so only the sweeper could have removed it
    assert_eq!(cache.len().await, 1);
    assert!(cache.stats().await.expirations >= 1);

    cache.stop_sweeper().await;
    assert!(!cache.is_sweeper_running().await);
}

// == Default Instance ==

#[tokio::test]
async fn test_default_instance_is_shared() {
    default_instance().set("shared_default_key", "v", None).await.unwrap();

    assert_eq!(default_instance().get("shared_default_key").await, Some(json!("v")));
    assert_eq!(create_test_cache().get("shared_default_key").await, None);

    default_instance().delete("shared_default_key").await.unwrap();
}
