//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::time::Instant;

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value
    pub value: Value,
    /// Creation instant
    pub created_at: Instant,
    /// Expiration instant, None = no expiration
    pub expires_at: Option<Instant>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry with optional TTL.
    ///
    /// A zero TTL means the entry never expires.
    pub fn new(value: Value, ttl: Option<Duration>) -> Self {
        let now = Instant::now();
        let expires_at = ttl.filter(|ttl| !ttl.is_zero()).map(|ttl| now + ttl);

        Self {
            value,
            created_at: now,
            expires_at,
        }
    }

    /// Creates an entry expiring at an absolute wall-clock time.
    ///
    /// A time already in the past yields an entry that is expired immediately.
    pub fn until(value: Value, expires_at: DateTime<Utc>) -> Self {
        let now = Instant::now();
        let remaining = (expires_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);

        Self {
            value,
            created_at: now,
            expires_at: Some(now + remaining),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at the given instant.
    ///
    /// An entry is expired once `now >= expires_at`.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    /// Checks if the entry has expired now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    // == Time To Live ==
    /// Returns remaining TTL, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` if the entry has expired
    /// - `Some(remaining)` if the entry has TTL and hasn't expired
    /// - `None` if the entry never expires
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|expires| expires.saturating_duration_since(Instant::now()))
    }
}
