//! Memoization
//!
//! `get_or_compute` returns the cached value for a key, or runs a producer
//! on a miss and caches what it returns. Options can pick a sub-value by
//! dotted path and decide, through a condition callback, whether and what
//! to cache.
//!
//! There is no single-flight deduplication: no lock is held while the
//! producer runs, so concurrent misses on one key each run their producer.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::cache::path::extract_path;
use crate::cache::Key;
use crate::config::Condition;
use crate::error::CacheError;
use crate::instance::CacheInstance;

// == Decision ==
/// Outcome of a condition callback.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Cache the produced value as is
    Cache,
    /// Cache this value instead of the produced one; `CacheWith(Null)`
    /// behaves like `Skip`
    CacheWith(Value),
    /// Do not cache; the produced value is still returned
    Skip,
}

impl From<bool> for Decision {
    fn from(cache: bool) -> Self {
        if cache {
            Decision::Cache
        } else {
            Decision::Skip
        }
    }
}

impl From<Option<Value>> for Decision {
    fn from(substitute: Option<Value>) -> Self {
        match substitute {
            None | Some(Value::Null) => Decision::Skip,
            Some(value) => Decision::CacheWith(value),
        }
    }
}

// == Use Options ==
/// Per-call options for [`CacheInstance::get_or_compute`].
///
/// Unset fields fall back to the instance's [`CacheConfig`](crate::CacheConfig).
#[derive(Clone, Default)]
pub struct UseOptions {
    /// Time to live for the cached value
    pub ttl: Option<Duration>,
    /// Absolute expiry; takes precedence over `ttl`
    pub expires_at: Option<DateTime<Utc>>,
    /// Dot path of the sub-value to cache, e.g. `"user.data"`
    pub extraction_path: Option<String>,
    /// Decides whether the produced value is cached
    pub condition: Option<Condition>,
}

impl UseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.extraction_path = Some(path.into());
        self
    }

    pub fn condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(&Value) -> Decision + Send + Sync + 'static,
    {
        self.condition = Some(Arc::new(condition));
        self
    }
}

impl fmt::Debug for UseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UseOptions")
            .field("ttl", &self.ttl)
            .field("expires_at", &self.expires_at)
            .field("extraction_path", &self.extraction_path)
            .field("condition", &self.condition.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl CacheInstance {
    // == Get Or Compute ==
    /// Returns the value cached at `key`, computing and caching it on a miss.
    ///
    /// On a hit, an expiry given in `options` is re-applied to the entry so
    /// a fresh TTL takes effect. On a miss the producer's error is returned
    /// as is and nothing is cached. When the condition says
    /// [`Decision::Skip`], the produced value is returned uncached. A missing
    /// extraction path fails with [`CacheError::PathNotFound`].
    pub async fn get_or_compute<K, F, Fut, V, E>(
        &self,
        key: K,
        producer: F,
        options: UseOptions,
    ) -> std::result::Result<Value, E>
    where
        K: Into<Key>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<V, E>>,
        V: Serialize,
        E: From<CacheError>,
    {
        let key = key.into();
        if key.is_empty() {
            return Err(CacheError::InvalidArgument("key must have at least one segment".to_string()).into());
        }

        if let Some(hit) = self.get_and_refresh(&key, options.ttl, options.expires_at).await {
            return Ok(hit);
        }

        debug!(%key, "cache miss, running producer");
        let produced = serde_json::to_value(producer().await?).map_err(CacheError::from)?;

        let config = self.config();
        let condition = options.condition.as_ref().or(config.condition.as_ref());
        let mut value = match condition.map(|decide| decide(&produced)) {
            None | Some(Decision::Cache) => produced,
            Some(Decision::CacheWith(Value::Null)) | Some(Decision::Skip) => {
                debug!(%key, "condition declined caching");
                return Ok(produced);
            }
            Some(Decision::CacheWith(substitute)) => substitute,
        };

        let path = options
            .extraction_path
            .as_deref()
            .or(config.extraction_path.as_deref())
            .filter(|path| !path.is_empty());
        if let Some(path) = path {
            value = extract_path(&value, path)
                .cloned()
                .ok_or_else(|| CacheError::PathNotFound(path.to_string()))?;
        }

        self.store_value(&key, value.clone(), &options).await?;
        Ok(value)
    }

    async fn store_value(&self, key: &Key, value: Value, options: &UseOptions) -> crate::Result<()> {
        match options.expires_at {
            Some(expires_at) => self.set_until(key, value, expires_at).await,
            None => self.set(key, value, options.ttl).await,
        }
    }
}
