//! Configuration Module
//!
//! Per-instance cache configuration, with defaults overridable from the
//! environment.

use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::memo::Decision;

/// Callback deciding whether, and what, to cache for a produced value.
pub type Condition = Arc<dyn Fn(&Value) -> Decision + Send + Sync>;

/// Cache configuration parameters.
///
/// Per-call options passed to `get_or_compute` take precedence over these.
#[derive(Clone)]
pub struct CacheConfig {
    /// TTL applied when a call gives none; zero means entries never expire
    pub default_ttl: Duration,
    /// Interval between expiration sweeps; zero or negative runs one sweep and stops
    pub sweep_interval_ms: i64,
    /// Dot path extracted from produced values before caching
    pub extraction_path: Option<String>,
    /// Decides whether produced values are cached
    pub condition: Option<Condition>,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 0, no expiry)
    /// - `CACHE_SWEEP_INTERVAL_MS` - Sweep interval in milliseconds (default: 60000)
    /// - `CACHE_EXTRACTION_PATH` - Default extraction path (default: none)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_ttl: env::var("CACHE_DEFAULT_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.default_ttl),
            sweep_interval_ms: env::var("CACHE_SWEEP_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.sweep_interval_ms),
            extraction_path: env::var("CACHE_EXTRACTION_PATH")
                .ok()
                .filter(|path| !path.is_empty()),
            condition: None,
        }
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn with_sweep_interval_ms(mut self, interval_ms: i64) -> Self {
        self.sweep_interval_ms = interval_ms;
        self
    }

    pub fn with_extraction_path(mut self, path: impl Into<String>) -> Self {
        self.extraction_path = Some(path.into());
        self
    }

    pub fn with_condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(&Value) -> Decision + Send + Sync + 'static,
    {
        self.condition = Some(Arc::new(condition));
        self
    }

    /// The default TTL as an optional duration, `None` when entries never expire.
    pub fn ttl(&self) -> Option<Duration> {
        Some(self.default_ttl).filter(|ttl| !ttl.is_zero())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::ZERO,
            sweep_interval_ms: 60_000,
            extraction_path: None,
            condition: None,
        }
    }
}

impl fmt::Debug for CacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfig")
            .field("default_ttl", &self.default_ttl)
            .field("sweep_interval_ms", &self.sweep_interval_ms)
            .field("extraction_path", &self.extraction_path)
            .field("condition", &self.condition.as_ref().map(|_| "<fn>"))
            .finish()
    }
}
