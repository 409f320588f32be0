//! Account model and persistence boundary
//!
//! An account is one provider credential: an api key plus its activity flag
//! and remaining request budget. This crate owns the domain model and the two
//! storage seams the pool depends on:
//!
//! - [`AccountStore`]: relational persistence of accounts. The in-memory
//!   implementation carries the `fetch_minimal` covering-prefix policy that
//!   the replenishment algorithm relies on.
//! - [`PendingStore`]: a TTL set of correlation tokens for fabrication
//!   requests that were sent but not yet answered.
//!
//! Production deployments implement both traits over their own backends; the
//! in-memory variants here are the reference implementations and the test
//! doubles.

mod account;
mod error;
mod memory;
mod pending;
mod store;

pub use account::{Account, AccountId, ApiKey};
pub use error::{Result, StoreError};
pub use memory::MemoryAccountStore;
pub use pending::{MemoryPendingStore, PendingStore};
pub use store::AccountStore;
