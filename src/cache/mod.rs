//! Cache Module
//!
//! Provides the hierarchical in-memory store with TTL expiration.

mod entry;
mod key;
pub mod path;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use key::Key;
pub use stats::CacheStats;
pub use store::CacheStore;
