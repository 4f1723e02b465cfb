//! Cache Store Module
//!
//! The addressable tree of entries, plus the set of keys carrying a TTL
//! that the expiration sweeper walks.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;

use crate::cache::path::{resolve_for_read, resolve_for_read_mut, resolve_for_write, Branch, Node};
use crate::cache::{CacheEntry, CacheStats, Key};
use crate::error::{CacheError, Result};

// == Cache Store ==
/// Hierarchical cache storage with TTL support.
///
/// Not synchronized on its own; `CacheInstance` keeps it behind a
/// `tokio::sync::RwLock` shared with the sweeper.
#[derive(Debug, Default)]
pub struct CacheStore {
    /// Root container
    root: Branch,
    /// Keys stored with a TTL; may hold stale keys until the next sweep
    expiring: HashSet<Key>,
    /// Lookup and expiration statistics
    stats: CacheStats,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    // == Set ==
    /// Stores a value with optional TTL, creating containers along the key.
    ///
    /// Overwrites any entry (or container) already at the address. A TTL of
    /// zero means no expiration.
    pub fn set(&mut self, key: &Key, value: Value, ttl: Option<Duration>) -> Result<()> {
        self.insert_entry(key, CacheEntry::new(value, ttl))
    }

    /// Stores a value that expires at an absolute wall-clock time.
    pub fn set_until(&mut self, key: &Key, value: Value, expires_at: DateTime<Utc>) -> Result<()> {
        self.insert_entry(key, CacheEntry::until(value, expires_at))
    }

    fn insert_entry(&mut self, key: &Key, entry: CacheEntry) -> Result<()> {
        let expiring = entry.expires_at.is_some();
        let (parent, last) = resolve_for_write(&mut self.root, key).ok_or_else(|| {
            CacheError::InvalidArgument("key must have at least one segment".to_string())
        })?;

        if let Some(Node::Branch(children)) = parent.insert(last.to_string(), Node::Leaf(entry)) {
            debug!(%key, dropped = children.len(), "entry replaced a container");
        }

        if expiring {
            self.expiring.insert(key.clone());
        } else {
            self.expiring.remove(key);
        }
        Ok(())
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns `None` if the key is missing, addresses a container, or has
    /// expired. Expired entries are removed on the spot.
    pub fn get(&mut self, key: &Key) -> Option<Value> {
        let now = Instant::now();
        let Some((parent, last)) = resolve_for_read_mut(&mut self.root, key) else {
            self.stats.record_miss();
            return None;
        };

        let expires_at = match parent.get(last) {
            Some(Node::Leaf(entry)) => entry.expires_at,
            _ => {
                self.stats.record_miss();
                return None;
            }
        };

        if expires_at.is_some_and(|expires| now >= expires) {
            parent.remove(last);
            self.expiring.remove(key);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            debug!(%key, "evicted expired entry on read");
            return None;
        }

        self.stats.record_hit();
        match parent.get(last) {
            Some(Node::Leaf(entry)) => Some(entry.value.clone()),
            _ => None,
        }
    }

    // == Get And Refresh ==
    /// Retrieves a live value and, when an expiry is given, re-stores it with
    /// that expiry in the same step. `expires_at` takes precedence over `ttl`.
    ///
    /// With neither given this is a plain [`CacheStore::get`].
    pub fn get_and_refresh(
        &mut self,
        key: &Key,
        ttl: Option<Duration>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Option<Value> {
        let value = self.get(key)?;

        let refreshed = match (expires_at, ttl) {
            (Some(at), _) => Some(CacheEntry::until(value.clone(), at)),
            (None, Some(ttl)) => Some(CacheEntry::new(value.clone(), Some(ttl))),
            (None, None) => None,
        };
        if let Some(entry) = refreshed {
            // The key resolved on read, so it has at least one segment
            if let Err(err) = self.insert_entry(key, entry) {
                debug!(%key, error = %err, "refresh skipped");
            }
        }
        Some(value)
    }

    // == Contains ==
    /// Returns true if a live entry exists at `key`. Does not evict or count.
    pub fn contains(&self, key: &Key) -> bool {
        let now = Instant::now();
        resolve_for_read(&self.root, key)
            .and_then(|(parent, last)| parent.get(last))
            .is_some_and(|node| matches!(node, Node::Leaf(entry) if !entry.is_expired_at(now)))
    }

    // == Delete ==
    /// Removes the entry at `key` and returns its value.
    ///
    /// Returns `None` if nothing live is stored there. A container at the
    /// address is left untouched; use [`CacheStore::delete_group`] for that.
    pub fn delete(&mut self, key: &Key) -> Option<Value> {
        let now = Instant::now();
        let (parent, last) = resolve_for_read_mut(&mut self.root, key)?;
        if !matches!(parent.get(last), Some(Node::Leaf(_))) {
            return None;
        }

        let Some(Node::Leaf(entry)) = parent.remove(last) else {
            return None;
        };
        self.expiring.remove(key);

        if entry.is_expired_at(now) {
            self.stats.record_expirations(1);
            return None;
        }
        Some(entry.value)
    }

    // == Delete Group ==
    /// Removes whatever is stored at `key`, container or entry.
    ///
    /// Returns the number of entries removed.
    pub fn delete_group(&mut self, key: &Key) -> usize {
        let Some((parent, last)) = resolve_for_read_mut(&mut self.root, key) else {
            return 0;
        };
        let removed = parent.remove(last).map_or(0, |node| node.entry_count());

        self.expiring.retain(|tracked| !tracked.starts_with(key));
        removed
    }

    // == Delete All ==
    /// Drops every entry and container.
    pub fn delete_all(&mut self) {
        self.root = Branch::new();
        self.expiring.clear();
    }

    // == Sweep Expired ==
    /// Evicts every tracked entry whose TTL has elapsed.
    ///
    /// Tracked keys that no longer address an expiring entry are dropped
    /// from the tracked set. Returns the number of entries evicted.
    pub fn sweep_expired(&mut self) -> usize {
        let now = Instant::now();
        let tracked: Vec<Key> = self.expiring.iter().cloned().collect();
        let mut removed = 0;

        for key in tracked {
            let Some((parent, last)) = resolve_for_read_mut(&mut self.root, &key) else {
                self.expiring.remove(&key);
                continue;
            };

            let expires_at = match parent.get(last) {
                Some(Node::Leaf(entry)) => entry.expires_at,
                _ => None,
            };

            match expires_at {
                Some(expires) if now >= expires => {
                    parent.remove(last);
                    self.expiring.remove(&key);
                    removed += 1;
                }
                Some(_) => {}
                None => {
                    self.expiring.remove(&key);
                }
            }
        }

        self.stats.record_expirations(removed);
        self.stats.record_sweep();
        removed
    }

    /// Forgets every tracked key without touching the entries.
    pub fn clear_tracked(&mut self) {
        self.expiring.clear();
    }

    /// Number of keys currently tracked for expiration.
    pub fn tracked_len(&self) -> usize {
        self.expiring.len()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.len());
        stats
    }

    // == Length ==
    /// Returns the number of entries in the cache, expired ones included
    /// until they are evicted.
    pub fn len(&self) -> usize {
        self.root.values().map(Node::entry_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
