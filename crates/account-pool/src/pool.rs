//! Account pool and replenishment algorithm
//!
//! `AccountPool` owns the reusable queue and the pending-fabrication set and
//! runs the health check that keeps pooled budget near `requests_capacity`.
//! The health check is a best-effort stabilizer: it runs before and after
//! every `get` and after every fabrication response, tolerates overlapping
//! invocations, and never propagates an error - a failed pass is simply
//! retried on the next trigger.
//!
//! Replenishment dispatches are fire-and-forget, but each one registers a
//! TTL-bound correlation token first and runs inside a supervised task set,
//! so shutdown can abort them all without leaving the pending set
//! inconsistent: an aborted dispatch leaves its token to expire naturally.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use account_store::{Account, AccountStore, ApiKey, PendingStore, StoreError};
use fabrication::{CorrelationId, FabricationOutcome, FabricationProducer};

use crate::error::{Error, Result};
use crate::policy;
use crate::queue::ReusableQueue;
use crate::verify::AccountVerifier;

/// Pool sizing and replenishment settings. All values are positive; the
/// configuration loader enforces this before the pool is built.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Target total budget kept in the pool.
    pub requests_capacity: u32,
    /// Assumed budget per newly fabricated account, used only to size demand.
    pub requests_per_account: u32,
    /// Concurrency cap on outstanding fabrications.
    pub max_pending_requests: u32,
    /// Hysteresis band below capacity within which the pool is "stocked".
    pub sync_inaccuracy: u32,
    /// TTL for pending correlation tokens.
    pub pending_token_ttl: Duration,
}

/// A pooled account handle.
///
/// The queue re-enqueues the same handle it hands out, and callers decrement
/// the budget through it, so every copy observes one shared `Account`. The
/// api key is cached outside the lock: it is immutable and doubles as the
/// queue identity.
#[derive(Clone)]
pub struct PoolAccount {
    api_key: ApiKey,
    account: Arc<Mutex<Account>>,
}

impl PoolAccount {
    fn new(account: Account) -> Self {
        Self {
            api_key: account.api_key.clone(),
            account: Arc::new(Mutex::new(account)),
        }
    }

    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    /// Current state of the underlying account.
    pub async fn snapshot(&self) -> Account {
        self.account.lock().await.clone()
    }
}

/// Concurrent pool of provider accounts with autonomous replenishment.
pub struct AccountPool {
    config: PoolConfig,
    queue: ReusableQueue<PoolAccount, ApiKey>,
    store: Arc<dyn AccountStore>,
    pending: Arc<dyn PendingStore>,
    producer: Arc<dyn FabricationProducer>,
    verifier: Arc<dyn AccountVerifier>,
    loading: AtomicBool,
    dispatches: Mutex<JoinSet<()>>,
}

impl AccountPool {
    pub fn new(
        config: PoolConfig,
        store: Arc<dyn AccountStore>,
        pending: Arc<dyn PendingStore>,
        producer: Arc<dyn FabricationProducer>,
        verifier: Arc<dyn AccountVerifier>,
    ) -> Self {
        info!(
            requests_capacity = config.requests_capacity,
            requests_per_account = config.requests_per_account,
            max_pending_requests = config.max_pending_requests,
            "account pool initialized"
        );
        Self {
            config,
            queue: ReusableQueue::new(|account: &PoolAccount| account.api_key.clone()),
            store,
            pending,
            producer,
            verifier,
            loading: AtomicBool::new(false),
            dispatches: Mutex::new(JoinSet::new()),
        }
    }

    /// One stabilization pass at startup.
    pub async fn initialize(&self) {
        self.health_check().await;
    }

    /// Lease an account for one provider request.
    ///
    /// Suspends until the pool can serve one. The returned account has
    /// already had its budget decremented and persisted; exhausted accounts
    /// are deactivated in the store on the way out. Store failures surface to
    /// the caller since the budget state would otherwise be ambiguous.
    pub async fn get(&self) -> Result<PoolAccount> {
        self.health_check().await;

        let handle = self.queue.get().await;
        let (id, available_requests, exhausted) = {
            let mut account = handle.account.lock().await;
            account.decrement_requests();
            (
                account.id,
                account.available_requests.unwrap_or(0),
                !account.has_requests(),
            )
        };

        if let Some(id) = id {
            self.store.set_available_requests(id, available_requests).await?;
            if exhausted {
                debug!(account_id = %id, "budget exhausted, deactivating");
                self.store.deactivate(id).await?;
                metrics::counter!("pool_accounts_deactivated_total").increment(1);
            }
        }

        self.health_check().await;

        debug!(account_id = ?id, "leased account");
        Ok(handle)
    }

    /// Re-check a credential a caller found unauthorized or exhausted
    /// mid-use, and persist what the provider actually reports.
    ///
    /// A credential the provider confirms dead is expired out of the queue
    /// (lazily, the next `get` that reaches it drops it), so other callers
    /// stop drawing on it.
    pub async fn expire_account(&self, handle: &PoolAccount) -> Result<Account> {
        let verified = {
            let mut account = handle.account.lock().await;
            self.verify_into(&mut account).await?;
            account.clone()
        };
        if !verified.is_active || !verified.has_requests() {
            self.queue.expire(handle).await;
        }
        let Some(id) = verified.id else {
            return Err(Error::Verification(
                "account was never persisted".to_owned(),
            ));
        };

        info!(
            account_id = %id,
            is_active = verified.is_active,
            available_requests = ?verified.available_requests,
            "updating account status"
        );
        let updated = self
            .store
            .update_status(
                id,
                verified.is_active,
                verified.available_requests.unwrap_or(0),
            )
            .await?
            .ok_or(StoreError::NotFound(id.0))?;
        Ok(updated)
    }

    /// Handle the decoded outcome of a fabrication exchange.
    ///
    /// The correlation token leaves the pending set no matter how the
    /// exchange went, and a health check always follows so the pool reacts
    /// to the new state immediately.
    pub async fn on_fabrication_response(&self, outcome: FabricationOutcome) -> Result<()> {
        let result = self.process_response(outcome).await;
        self.pending.remove_expired().await;
        self.health_check().await;
        result
    }

    /// Best-effort stabilization pass; overlapping invocations degrade to
    /// no-ops. Errors are logged, never propagated.
    pub async fn health_check(&self) {
        if let Err(error) = self.health_check_inner().await {
            warn!(%error, "health check failed");
        }
    }

    /// Abort and drain all outstanding fabrication dispatches. Their tokens
    /// stay in the pending set until the TTL reclaims them.
    pub async fn shutdown(&self) {
        let mut dispatches = self.dispatches.lock().await;
        dispatches.shutdown().await;
        info!("account pool shut down");
    }

    /// Pool summary for the gateway health endpoint.
    pub async fn health(&self) -> serde_json::Value {
        let available = self.queue.remaining().await;
        let capacity = i64::from(self.config.requests_capacity);
        let floor = capacity - i64::from(self.config.sync_inaccuracy);
        let status = if available >= floor {
            "healthy"
        } else if available > 0 {
            "degraded"
        } else {
            "unhealthy"
        };

        serde_json::json!({
            "status": status,
            "available_requests": available,
            "requests_capacity": self.config.requests_capacity,
            "pending_fabrications": self.pending.count_alive().await,
            "loading": self.loading.load(Ordering::SeqCst),
        })
    }

    async fn health_check_inner(&self) -> Result<()> {
        self.reap_dispatches().await;
        self.pending.remove_expired().await;

        let capacity = i64::from(self.config.requests_capacity);
        let floor = capacity - i64::from(self.config.sync_inaccuracy);

        let available = self.queue.remaining().await;
        if !self.loading() && available >= floor {
            debug!(available, "sufficient pooled budget");
            return Ok(());
        }

        if !self.loading() {
            self.fetch_and_fill_minimal().await?;
        }

        let available = self.queue.remaining().await;
        metrics::gauge!("pool_available_requests").set(available as f64);
        if available >= capacity {
            debug!(available, "pool restocked from store");
            return Ok(());
        }

        self.loading.store(true, Ordering::SeqCst);

        let available = self.queue.remaining().await;
        let pending = self.pending.count_alive().await;
        let accounts_to_request = policy::accounts_to_request(
            self.config.requests_capacity,
            available,
            self.config.requests_per_account,
        );
        let demand = accounts_to_request - pending as i64;

        if demand <= 0 {
            if pending == 0 {
                self.loading.store(false, Ordering::SeqCst);
            }
            debug!(demand, pending, "no new accounts required");
            return Ok(());
        }

        let max_pending = i64::from(self.config.max_pending_requests);
        if pending as i64 >= max_pending {
            debug!(pending, "pending fabrication limit reached");
            return Ok(());
        }

        let slots = max_pending - pending as i64;
        let to_send = demand.min(slots);
        debug!(demand, to_send, "dispatching fabrication requests");

        let mut dispatches = self.dispatches.lock().await;
        for _ in 0..to_send {
            let id = CorrelationId::generate();
            self.pending
                .add(id.as_str(), self.config.pending_token_ttl)
                .await;
            let producer = Arc::clone(&self.producer);
            dispatches.spawn(async move {
                if let Err(error) = producer.fabricate_account(&id).await {
                    warn!(correlation_id = %id, %error, "failed to dispatch fabrication request");
                }
            });
            metrics::counter!("pool_fabrication_requests_total").increment(1);
        }
        Ok(())
    }

    async fn process_response(&self, outcome: FabricationOutcome) -> Result<()> {
        self.pending.remove(outcome.id.as_str()).await;

        match outcome.result {
            Ok(mut account) => {
                metrics::counter!("pool_fabrication_responses_total", "outcome" => "success")
                    .increment(1);
                self.verify_into(&mut account).await?;
                let created = self.store.create(account).await?;
                if created.is_active && created.has_requests() {
                    self.enqueue(created).await?;
                    debug!("fabricated account created and added to the pool");
                } else {
                    warn!(
                        api_key = %created.api_key,
                        "fabricated credential unusable, kept out of the pool"
                    );
                }
                Ok(())
            }
            Err(error) => {
                metrics::counter!("pool_fabrication_responses_total", "outcome" => "failure")
                    .increment(1);
                warn!(%error, "account fabrication failed");
                Ok(())
            }
        }
    }

    /// Resync the queue against the store: fetch the minimal set of active
    /// accounts covering the capacity target, then flush and re-seed. The
    /// fetch happens first so a store failure leaves the live queue untouched.
    async fn fetch_and_fill_minimal(&self) -> Result<()> {
        let required = self.config.requests_capacity;
        let (covered, accounts) = self.store.fetch_minimal(required).await?;
        debug!(required, covered, "re-seeding pool from store");

        self.queue.flush().await;

        for account in accounts {
            if account.has_requests() {
                self.enqueue(account).await?;
            } else {
                warn!(
                    api_key = %account.api_key,
                    "active account without budget skipped during re-seed"
                );
            }
        }
        Ok(())
    }

    async fn enqueue(&self, account: Account) -> Result<()> {
        let budget = i64::from(account.available_requests.unwrap_or(0));
        self.queue.put(PoolAccount::new(account), budget).await
    }

    /// Refresh activity and budget from the provider, writing the result into
    /// the account.
    async fn verify_into(&self, account: &mut Account) -> Result<()> {
        let verification = self
            .verifier
            .verify(&account.api_key)
            .await
            .map_err(|e| Error::Verification(e.to_string()))?;
        account.set_active(verification.is_active);
        account.set_available_requests(verification.available_requests);
        info!(
            api_key = %account.api_key,
            is_active = verification.is_active,
            available_requests = verification.available_requests,
            "verified credential"
        );
        Ok(())
    }

    async fn reap_dispatches(&self) {
        let mut dispatches = self.dispatches.lock().await;
        while dispatches.try_join_next().is_some() {}
    }

    fn loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }
}
