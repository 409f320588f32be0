//! Credential pool and replenishment engine
//!
//! Serves callers from a pool of rate-limited provider accounts and keeps the
//! pool stocked by requesting new accounts through the asynchronous
//! fabrication workflow. The pool tracks budget, not account count: its
//! "length" is the total number of requests the queued credentials can still
//! absorb.
//!
//! Account lifecycle:
//! 1. Health check finds the pool under capacity → re-seeds from the store's
//!    minimal covering set of active accounts
//! 2. Still under capacity → computes demand and dispatches fabrication
//!    requests, each deduplicated by a TTL-bound correlation token
//! 3. Worker responds `ready` → budget verified against the provider, account
//!    persisted, fed into the queue
//! 4. `get` hands out the head account round-robin until its retrieval budget
//!    is spent, decrementing and persisting its remaining budget
//! 5. Budget reaches zero → account deactivated in the store, never deleted
//! 6. Fabrications that never answer expire from the pending set and free a
//!    demand slot for the next health check

pub mod consumer;
pub mod error;
pub mod policy;
pub mod pool;
pub mod queue;
pub mod verify;

pub use consumer::run_consumer;
pub use error::{Error, Result};
pub use pool::{AccountPool, PoolAccount, PoolConfig};
pub use queue::ReusableQueue;
pub use verify::{AccountVerifier, Verification, VerifyError};
