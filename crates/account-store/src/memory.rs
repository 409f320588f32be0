//! In-memory account store
//!
//! Reference implementation of [`AccountStore`]. A single tokio Mutex
//! serializes all access, so every method is trivially one atomic commit.
//! Accounts are held in insertion order; `fetch_minimal` sorts by sign-up
//! time with the identifier as tie-break, matching the relational query it
//! stands in for.

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::account::{Account, AccountId};
use crate::error::Result;
use crate::store::AccountStore;

#[derive(Default)]
struct State {
    next_id: i64,
    accounts: Vec<Account>,
}

/// Mutex-guarded in-memory [`AccountStore`].
#[derive(Default)]
pub struct MemoryAccountStore {
    state: Mutex<State>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts, active or not.
    pub async fn len(&self) -> usize {
        self.state.lock().await.accounts.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

impl State {
    fn find_mut(&mut self, id: AccountId) -> Option<&mut Account> {
        self.accounts.iter_mut().find(|a| a.id == Some(id))
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn create(&self, mut account: Account) -> Result<Account> {
        let mut state = self.state.lock().await;
        state.next_id += 1;
        account.id = Some(AccountId(state.next_id));
        account.sign_up = Some(unix_now());
        state.accounts.push(account.clone());
        debug!(account_id = state.next_id, "account created");
        Ok(account)
    }

    async fn get(&self, id: AccountId) -> Result<Option<Account>> {
        let state = self.state.lock().await;
        Ok(state.accounts.iter().find(|a| a.id == Some(id)).cloned())
    }

    async fn activate(&self, id: AccountId) -> Result<Option<Account>> {
        let mut state = self.state.lock().await;
        Ok(state.find_mut(id).map(|account| {
            account.is_active = true;
            account.clone()
        }))
    }

    async fn deactivate(&self, id: AccountId) -> Result<Option<Account>> {
        let mut state = self.state.lock().await;
        Ok(state.find_mut(id).map(|account| {
            account.is_active = false;
            account.clone()
        }))
    }

    async fn set_available_requests(
        &self,
        id: AccountId,
        available_requests: u32,
    ) -> Result<Option<Account>> {
        let mut state = self.state.lock().await;
        Ok(state.find_mut(id).map(|account| {
            account.available_requests = Some(available_requests);
            account.clone()
        }))
    }

    async fn update_status(
        &self,
        id: AccountId,
        is_active: bool,
        available_requests: u32,
    ) -> Result<Option<Account>> {
        let mut state = self.state.lock().await;
        Ok(state.find_mut(id).map(|account| {
            account.is_active = is_active;
            account.available_requests = Some(available_requests);
            account.clone()
        }))
    }

    async fn fetch_minimal(&self, required_requests: u32) -> Result<(u64, Vec<Account>)> {
        let state = self.state.lock().await;
        let mut active: Vec<&Account> = state.accounts.iter().filter(|a| a.is_active).collect();
        active.sort_by_key(|a| (a.sign_up, a.id.map(|id| id.0)));

        let mut covered = 0u64;
        let mut prefix = Vec::new();
        for account in active {
            prefix.push(account.clone());
            covered += u64::from(account.available_requests.unwrap_or(0));
            if covered >= u64::from(required_requests) {
                break;
            }
        }
        debug!(
            required = required_requests,
            covered,
            accounts = prefix.len(),
            "fetched minimal covering set"
        );
        Ok((covered, prefix))
    }
}
