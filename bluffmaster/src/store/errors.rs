//! Persistence error types.

use thiserror::Error;

/// Snapshot store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Redis error
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Snapshot could not be encoded or decoded
    #[error("Snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
