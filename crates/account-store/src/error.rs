//! Error types for store operations

/// Errors from account persistence.
///
/// Any variant reaching the pool is treated as transient: the surrounding
/// operation fails, nothing is half-applied, and the next health check
/// retries.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("account not found: {0}")]
    NotFound(i64),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
