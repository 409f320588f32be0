//! Error types for pool operations

use account_store::StoreError;

/// Errors from pool operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Non-positive retrieval budget handed to the queue. Programmer error;
    /// fails fast.
    #[error("retrieval budget must be positive, got {0}")]
    InvalidBudget(i64),

    /// Persistence failed; the transaction was rolled back and the budget
    /// state is unchanged.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The provider rejected or could not confirm a credential. The account
    /// is not enqueued.
    #[error("verification failed: {0}")]
    Verification(String),
}

/// Result alias for pool operations.
pub type Result<T> = std::result::Result<T, Error>;
