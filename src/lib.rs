//! Tree Cache - An in-process hierarchical cache
//!
//! Provides nested key addressing, TTL expiration with a background sweep,
//! and compute-if-absent memoization.

pub mod cache;
pub mod config;
pub mod error;
pub mod instance;
pub mod memo;
pub mod tasks;

pub use cache::{CacheStats, Key};
pub use config::{CacheConfig, Condition};
pub use error::{CacheError, Result};
pub use instance::{create_instance, default_instance, CacheInstance};
pub use memo::{Decision, UseOptions};
pub use tasks::ExpirationSweeper;
