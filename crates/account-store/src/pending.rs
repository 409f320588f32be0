//! Pending-fabrication token set
//!
//! A TTL set of correlation tokens. An entry's presence, not its value, means
//! "a fabrication is outstanding" - the only signal the pool has for in-flight
//! work, since the external worker may never answer. Expiry is lazy: entries
//! past their TTL are dropped when observed, there is no timer task.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// TTL set over opaque string tokens.
///
/// Implementations swallow their own backend failures (logging them and
/// degrading to "no entries") rather than surfacing errors; the pool treats
/// the live count as best-effort.
#[async_trait]
pub trait PendingStore: Send + Sync {
    /// Register a token that stays alive for `ttl`.
    async fn add(&self, token: &str, ttl: Duration);

    async fn remove(&self, token: &str);

    /// Drop every entry past its TTL and return the abandoned tokens.
    async fn remove_expired(&self) -> Vec<String>;

    /// Number of entries not yet past their TTL.
    async fn count_alive(&self) -> usize;
}

/// In-memory [`PendingStore`] keyed on tokio's clock, so TTL behavior is
/// testable under a paused runtime.
#[derive(Default)]
pub struct MemoryPendingStore {
    deadlines: Mutex<HashMap<String, Instant>>,
}

impl MemoryPendingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PendingStore for MemoryPendingStore {
    async fn add(&self, token: &str, ttl: Duration) {
        let mut deadlines = self.deadlines.lock().await;
        deadlines.insert(token.to_owned(), Instant::now() + ttl);
    }

    async fn remove(&self, token: &str) {
        let mut deadlines = self.deadlines.lock().await;
        deadlines.remove(token);
    }

    async fn remove_expired(&self) -> Vec<String> {
        let now = Instant::now();
        let mut deadlines = self.deadlines.lock().await;
        let expired: Vec<String> = deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(token, _)| token.clone())
            .collect();
        for token in &expired {
            deadlines.remove(token);
        }
        if !expired.is_empty() {
            debug!(abandoned = expired.len(), "purged expired pending tokens");
        }
        expired
    }

    async fn count_alive(&self) -> usize {
        let now = Instant::now();
        let deadlines = self.deadlines.lock().await;
        deadlines.values().filter(|deadline| **deadline > now).count()
    }
}
