//! Error types for the cache store boundary.

use thiserror::Error;

/// Cache store errors.
///
/// These exist at the [`CacheStore`](crate::CacheStore) boundary only: the
/// [`DurableCache`](crate::DurableCache) adapter swallows and logs every one
/// of them, so callers above the adapter never see a storage failure.
#[derive(Error, Debug)]
pub enum CacheError {
    /// IO error (file system store)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed stored JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Store unavailable or over quota
    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

impl CacheError {
    /// Create an unavailable error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}
