//! Cache Instances
//!
//! A `CacheInstance` ties one store, one configuration and one expiration
//! sweeper together. Instances never share state; a process-wide default
//! instance is created lazily for callers that do not need their own.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::cache::{CacheStats, CacheStore, Key};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::tasks::ExpirationSweeper;

struct InstanceInner {
    store: Arc<RwLock<CacheStore>>,
    config: CacheConfig,
    sweeper: ExpirationSweeper,
}

// == Cache Instance ==
/// Handle to an independent cache.
///
/// Cloning is cheap and clones share the same store. Keys accept either a
/// single string or a sequence of segments (see [`Key`]).
#[derive(Clone)]
pub struct CacheInstance {
    inner: Arc<InstanceInner>,
}

impl CacheInstance {
    /// Creates an empty cache with a stopped sweeper.
    pub fn new(config: CacheConfig) -> Self {
        let store = Arc::new(RwLock::new(CacheStore::new()));
        let sweeper = ExpirationSweeper::new(store.clone(), config.sweep_interval_ms);

        Self {
            inner: Arc::new(InstanceInner {
                store,
                config,
                sweeper,
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    // == Get ==
    /// Retrieves a live value, or `None` if missing or expired.
    pub async fn get(&self, key: impl Into<Key>) -> Option<Value> {
        let key = key.into();
        self.inner.store.write().await.get(&key)
    }

    /// Retrieves a live value and re-applies the given expiry under a single
    /// write guard, so no other write can land between the read and the refresh.
    pub(crate) async fn get_and_refresh(
        &self,
        key: &Key,
        ttl: Option<Duration>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Option<Value> {
        self.inner.store.write().await.get_and_refresh(key, ttl, expires_at)
    }

    /// Returns true if a live value is stored at `key`.
    pub async fn contains(&self, key: impl Into<Key>) -> bool {
        let key = key.into();
        self.inner.store.read().await.contains(&key)
    }

    // == Set ==
    /// Stores a value. Without an explicit TTL the configured default applies;
    /// `Some(Duration::ZERO)` stores it without expiration.
    pub async fn set(&self, key: impl Into<Key>, value: impl Into<Value>, ttl: Option<Duration>) -> Result<()> {
        let key = key.into();
        let ttl = ttl.or_else(|| self.inner.config.ttl());
        self.inner.store.write().await.set(&key, value.into(), ttl)
    }

    /// Stores a value that expires at an absolute wall-clock time.
    pub async fn set_until(
        &self,
        key: impl Into<Key>,
        value: impl Into<Value>,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let key = key.into();
        self.inner.store.write().await.set_until(&key, value.into(), expires_at)
    }

    // == Delete ==
    /// Removes the value at `key` and returns it, or `Ok(None)` if nothing
    /// live was stored there.
    ///
    /// Fails only when `key` has no segments.
    pub async fn delete(&self, key: impl Into<Key>) -> Result<Option<Value>> {
        let key = require_key(key.into())?;
        Ok(self.inner.store.write().await.delete(&key))
    }

    /// Removes everything stored under `key`, returning the number of entries removed.
    pub async fn delete_group(&self, key: impl Into<Key>) -> Result<usize> {
        let key = require_key(key.into())?;
        let removed = self.inner.store.write().await.delete_group(&key);
        debug!(%key, removed, "deleted cache group");
        Ok(removed)
    }

    /// Drops every entry in this instance.
    pub async fn delete_all(&self) {
        self.inner.store.write().await.delete_all();
        debug!("cache cleared");
    }

    pub async fn len(&self) -> usize {
        self.inner.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.store.read().await.is_empty()
    }

    pub async fn stats(&self) -> CacheStats {
        self.inner.store.read().await.stats()
    }

    // == Sweeper Control ==
    /// Starts the expiration sweeper; does nothing if it is already running.
    pub async fn start_sweeper(&self) -> Result<()> {
        self.inner.sweeper.start(false).await
    }

    /// Stops any running sweeper and starts a fresh one.
    pub async fn restart_sweeper(&self) -> Result<()> {
        self.inner.sweeper.start(true).await
    }

    pub async fn stop_sweeper(&self) {
        self.inner.sweeper.stop().await;
    }

    pub async fn is_sweeper_running(&self) -> bool {
        self.inner.sweeper.is_running().await
    }

    pub fn sweep_interval_ms(&self) -> i64 {
        self.inner.sweeper.interval_ms()
    }

    pub fn set_sweep_interval_ms(&self, interval_ms: i64) {
        self.inner.sweeper.set_interval_ms(interval_ms);
    }
}

fn require_key(key: Key) -> Result<Key> {
    if key.is_empty() {
        return Err(CacheError::InvalidArgument(
            "key must have at least one segment".to_string(),
        ));
    }
    Ok(key)
}

// == Factory ==
/// Creates an independent cache instance.
pub fn create_instance(config: CacheConfig) -> CacheInstance {
    CacheInstance::new(config)
}

static DEFAULT_INSTANCE: OnceLock<CacheInstance> = OnceLock::new();

/// Returns the process-wide default instance, creating it on first use from
/// the environment configuration.
pub fn default_instance() -> &'static CacheInstance {
    DEFAULT_INSTANCE.get_or_init(|| {
        info!("Creating default cache instance");
        CacheInstance::new(CacheConfig::from_env())
    })
}
