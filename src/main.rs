//! Tree Cache demo
//!
//! Walks through memoized lookups, nested keys, TTL expiry and the
//! background sweeper against a simulated slow backend.

use std::time::{Duration, Instant};

use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tree_cache::{create_instance, CacheConfig, Decision, UseOptions};

/// Stands in for a slow remote call.
async fn fetch_character(id: u32) -> anyhow::Result<Value> {
    tokio::time::sleep(Duration::from_millis(250)).await;
    Ok(json!({
        "status": 200,
        "data": { "id": id, "name": format!("character-{}", id), "species": "Human" },
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tree_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CacheConfig::from_env().with_sweep_interval_ms(500);
    info!(?config, "Configuration loaded");

    let cache = create_instance(config);
    cache.start_sweeper().await?;

    // Memoized fetch: only the first call reaches the backend
    for attempt in 1..=3 {
        let started = Instant::now();
        let name = cache
            .get_or_compute("character_14", || fetch_character(14), UseOptions::new().path("data.name"))
            .await?;
        info!("fetch {}: {} in {:?}", attempt, name, started.elapsed());
    }

    // Grouped keys, only cached when the backend answered 200
    let only_ok = UseOptions::new()
        .ttl(Duration::from_secs(1))
        .condition(|response| (response["status"] == 200).into())
        .path("data");
    for page in 1..=2u32 {
        let page_key = format!("page_{}", page);
        cache
            .get_or_compute(["characters", page_key.as_str()], || fetch_character(page), only_ok.clone())
            .await?;
    }
    info!("cached {} entries", cache.len().await);

    // Substitute what gets cached
    let species = cache
        .get_or_compute(
            "species_14",
            || fetch_character(14),
            UseOptions::new().condition(|response| Decision::CacheWith(response["data"]["species"].clone())),
        )
        .await?;
    info!("cached species: {}", species);

    // Let the page entries expire and the sweeper reclaim them
    tokio::time::sleep(Duration::from_millis(1600)).await;
    info!("after sweep: {} entries, stats {:?}", cache.len().await, cache.stats().await);

    let removed = cache.delete_group("characters").await?;
    info!("deleted {} entries from the characters group", removed);

    cache.stop_sweeper().await;
    cache.delete_all().await;
    info!("Demo complete");
    Ok(())
}
