//! Account persistence trait

use async_trait::async_trait;

use crate::account::{Account, AccountId};
use crate::error::Result;

/// Relational persistence boundary for accounts.
///
/// Every mutating method applies its change atomically: the mutation is
/// committed as one unit or not at all, and an `Err` means nothing was
/// persisted. Lookups by id return `Ok(None)` for unknown accounts rather
/// than an error.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Persist a new account, assigning its identifier and sign-up time.
    async fn create(&self, account: Account) -> Result<Account>;

    async fn get(&self, id: AccountId) -> Result<Option<Account>>;

    async fn activate(&self, id: AccountId) -> Result<Option<Account>>;

    /// Terminal for the credential's useful life; the row is retained.
    async fn deactivate(&self, id: AccountId) -> Result<Option<Account>>;

    async fn set_available_requests(
        &self,
        id: AccountId,
        available_requests: u32,
    ) -> Result<Option<Account>>;

    /// Update activity and budget in one commit.
    async fn update_status(
        &self,
        id: AccountId,
        is_active: bool,
        available_requests: u32,
    ) -> Result<Option<Account>>;

    /// The smallest prefix of active accounts, ordered by sign-up time, whose
    /// cumulative budget reaches `required_requests`, together with the
    /// cumulative total it covers. Returns every active account (and the
    /// smaller total) when the pool of accounts cannot cover the requirement.
    async fn fetch_minimal(&self, required_requests: u32) -> Result<(u64, Vec<Account>)>;
}
