//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside a cache instance.
//!
//! # Tasks
//! - Expiration sweep: evicts entries whose TTL has elapsed

mod sweeper;

pub use sweeper::ExpirationSweeper;
