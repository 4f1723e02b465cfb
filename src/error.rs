//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache operations.
///
/// A missing or expired key is not an error: lookups return `None` for that.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A key or argument the operation cannot work with
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The extraction path does not exist in the produced value
    #[error("Path not found in produced value: {0}")]
    PathNotFound(String),

    /// The produced value could not be converted into a cacheable payload
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The sweeper was started outside of a tokio runtime
    #[error("No tokio runtime available to run the expiration sweeper")]
    NoRuntime,
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CacheError::InvalidArgument("empty key".to_string());
        assert_eq!(err.to_string(), "Invalid argument: empty key");

        let err = CacheError::PathNotFound("a.b".to_string());
        assert_eq!(err.to_string(), "Path not found in produced value: a.b");
    }

    #[test]
    fn test_converts_into_anyhow() {
        let err: anyhow::Error = CacheError::NoRuntime.into();
        assert!(err.downcast_ref::<CacheError>().is_some());
    }
}
