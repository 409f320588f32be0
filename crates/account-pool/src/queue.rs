//! Reusable item queue
//!
//! A FIFO queue whose items may be retrieved a bounded number of times before
//! being discarded. Each `get` pops the head and, while the item's retrieval
//! budget lasts, re-appends it to the tail, so consumers rotate through the
//! live items round-robin. Expiry is out-of-band and lazy: `expire` only
//! marks the identity, and the next `get` that pops it drops it instead of
//! returning it.
//!
//! `remaining` is the pool-wide count of retrievals left across all queued
//! items - the "available budget", not the number of distinct items. An
//! item's final retrieval (the one that removes it) passes one below the
//! budget it was inserted with, so the counter is signed.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

use tokio::sync::{Mutex, Semaphore};

use crate::error::{Error, Result};

struct Entry {
    budget: i64,
    retrievals: i64,
    expired: bool,
}

struct Inner<T, K> {
    items: VecDeque<T>,
    entries: HashMap<K, Entry>,
    remaining: i64,
}

/// Concurrent queue of reusable, budget-limited items.
///
/// Generic over the item type and a key extractor producing the item's
/// hashable identity; one identity maps to at most one live bookkeeping
/// entry. All bookkeeping is serialized behind a single lock, and waiters in
/// `get` are served in arrival order.
pub struct ReusableQueue<T, K: Hash + Eq> {
    key_of: Box<dyn Fn(&T) -> K + Send + Sync>,
    inner: Mutex<Inner<T, K>>,
    // Fair semaphore; permits mirror the number of queued items.
    available: Semaphore,
}

impl<T: Clone, K: Hash + Eq> ReusableQueue<T, K> {
    pub fn new(key_of: impl Fn(&T) -> K + Send + Sync + 'static) -> Self {
        Self {
            key_of: Box::new(key_of),
            inner: Mutex::new(Inner {
                items: VecDeque::new(),
                entries: HashMap::new(),
                remaining: 0,
            }),
            available: Semaphore::new(0),
        }
    }

    /// Append an item that may be retrieved `expires_after` times.
    ///
    /// Fails with [`Error::InvalidBudget`] unless `expires_after` is positive;
    /// the queue is left unchanged in that case.
    pub async fn put(&self, item: T, expires_after: i64) -> Result<()> {
        if expires_after <= 0 {
            return Err(Error::InvalidBudget(expires_after));
        }

        let mut inner = self.inner.lock().await;
        let key = (self.key_of)(&item);
        inner.entries.insert(
            key,
            Entry {
                budget: expires_after,
                retrievals: 0,
                expired: false,
            },
        );
        inner.items.push_back(item);
        inner.remaining += expires_after;
        drop(inner);

        self.available.add_permits(1);
        Ok(())
    }

    /// Next item in FIFO order, suspending until one is available.
    ///
    /// Expired items are discarded on the way. An item whose retrievals have
    /// reached its budget is returned one final time without being
    /// re-appended; otherwise it goes back to the tail for the next round.
    pub async fn get(&self) -> T {
        loop {
            let permit = self
                .available
                .acquire()
                .await
                .expect("queue semaphore never closed");
            permit.forget();

            let mut guard = self.inner.lock().await;
            let inner = &mut *guard;
            // A concurrent flush may have drained the item this permit was
            // minted for.
            let Some(item) = inner.items.pop_front() else {
                continue;
            };
            let key = (self.key_of)(&item);
            let Some(entry) = inner.entries.get_mut(&key) else {
                continue;
            };

            if entry.expired {
                inner.entries.remove(&key);
                continue;
            }

            inner.remaining -= 1;

            if entry.retrievals >= entry.budget {
                // Last use: hand it out without re-enqueueing.
                inner.entries.remove(&key);
                return item;
            }

            entry.retrievals += 1;
            inner.items.push_back(item.clone());
            drop(guard);
            self.available.add_permits(1);
            return item;
        }
    }

    /// Mark an item expired without touching the live queue structure.
    ///
    /// The not-yet-retrieved portion of its budget leaves `remaining`
    /// immediately so the counter keeps measuring forward capacity. Unknown
    /// or already-expired identities are no-ops.
    pub async fn expire(&self, item: &T) {
        let key = (self.key_of)(item);
        let mut inner = self.inner.lock().await;
        let Some(entry) = inner.entries.get_mut(&key) else {
            return;
        };
        if entry.expired {
            return;
        }
        entry.expired = true;
        let not_retrieved = entry.budget - entry.retrievals;
        inner.remaining -= not_retrieved;
    }

    /// Drain the queue and reset all bookkeeping.
    pub async fn flush(&self) {
        let mut inner = self.inner.lock().await;
        let drained = inner.items.len();
        inner.items.clear();
        inner.entries.clear();
        inner.remaining = 0;
        for _ in 0..drained {
            if let Ok(permit) = self.available.try_acquire() {
                permit.forget();
            }
        }
    }

    /// Total remaining retrievals across queued items.
    pub async fn remaining(&self) -> i64 {
        self.inner.lock().await.remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue() -> ReusableQueue<&'static str, &'static str> {
        ReusableQueue::new(|item: &&str| *item)
    }

    #[tokio::test]
    async fn remaining_sums_budgets_after_puts() {
        let q = queue();
        q.put("a", 3).await.unwrap();
        q.put("b", 2).await.unwrap();
        assert_eq!(q.remaining().await, 5);
    }

    #[tokio::test]
    async fn each_get_decrements_remaining_by_one() {
        let q = queue();
        q.put("a", 3).await.unwrap();
        q.get().await;
        assert_eq!(q.remaining().await, 2);
        q.get().await;
        assert_eq!(q.remaining().await, 1);
    }

    #[tokio::test]
    async fn zero_and_negative_budgets_are_rejected() {
        let q = queue();
        assert!(matches!(
            q.put("a", 0).await,
            Err(Error::InvalidBudget(0))
        ));
        assert!(matches!(
            q.put("a", -1).await,
            Err(Error::InvalidBudget(-1))
        ));
        assert_eq!(q.remaining().await, 0);
    }

    #[tokio::test]
    async fn items_rotate_round_robin() {
        let q = queue();
        q.put("a", 2).await.unwrap();
        q.put("b", 2).await.unwrap();

        assert_eq!(q.get().await, "a");
        assert_eq!(q.get().await, "b");
        assert_eq!(q.get().await, "a");
        assert_eq!(q.get().await, "b");
    }

    #[tokio::test]
    async fn spent_item_is_not_reenqueued() {
        let q = std::sync::Arc::new(queue());
        q.put("a", 1).await.unwrap();

        // Budget 1: handed out once with a re-append, once more as last use.
        assert_eq!(q.get().await, "a");
        assert_eq!(q.get().await, "a");

        // Nothing left: a third get must suspend.
        let waiter = tokio::spawn({
            let q = q.clone();
            async move { q.get().await }
        });
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());
        waiter.abort();
    }

    #[tokio::test]
    async fn expired_item_is_never_returned() {
        let q = queue();
        q.put("a", 5).await.unwrap();
        assert_eq!(q.get().await, "a");
        assert_eq!(q.remaining().await, 4);

        q.expire(&"a").await;
        // budget 5, one retrieval: 4 forward retrievals leave the counter.
        assert_eq!(q.remaining().await, 0);

        q.put("b", 1).await.unwrap();
        assert_eq!(q.get().await, "b");
    }

    #[tokio::test]
    async fn expiring_twice_subtracts_once() {
        let q = queue();
        q.put("a", 4).await.unwrap();
        q.expire(&"a").await;
        q.expire(&"a").await;
        assert_eq!(q.remaining().await, 0);
    }

    #[tokio::test]
    async fn expiring_an_unknown_item_is_a_noop() {
        let q = queue();
        q.put("a", 2).await.unwrap();
        q.expire(&"ghost").await;
        assert_eq!(q.remaining().await, 2);
    }

    #[tokio::test]
    async fn flush_resets_everything() {
        let q = queue();
        q.put("a", 3).await.unwrap();
        q.put("b", 2).await.unwrap();
        q.flush().await;
        assert_eq!(q.remaining().await, 0);

        q.put("c", 1).await.unwrap();
        assert_eq!(q.get().await, "c");
    }

    #[tokio::test]
    async fn get_suspends_until_an_item_arrives() {
        let q = std::sync::Arc::new(ReusableQueue::<String, String>::new(|item: &String| {
            item.clone()
        }));

        let waiter = tokio::spawn({
            let q = q.clone();
            async move { q.get().await }
        });
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        q.put("a".to_owned(), 1).await.unwrap();
        assert_eq!(waiter.await.unwrap(), "a");
    }

    #[tokio::test]
    async fn waiters_are_served_in_arrival_order() {
        let q = std::sync::Arc::new(ReusableQueue::<String, String>::new(|item: &String| {
            item.clone()
        }));

        let first = tokio::spawn({
            let q = q.clone();
            async move { q.get().await }
        });
        tokio::task::yield_now().await;
        let second = tokio::spawn({
            let q = q.clone();
            async move { q.get().await }
        });
        tokio::task::yield_now().await;

        q.put("a".to_owned(), 1).await.unwrap();
        q.put("b".to_owned(), 1).await.unwrap();

        assert_eq!(first.await.unwrap(), "a");
        assert_eq!(second.await.unwrap(), "b");
    }
}
