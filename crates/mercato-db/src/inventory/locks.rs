//! # Stock Key Locks
//!
//! In-process mutual exclusion per `(product_id, location_id)`.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DashMap<(product, location), Arc<Mutex<()>>>                           │
//! │                                                                         │
//! │  reserve(p1, A)            ──► lock (p1,A) ──► BEGIN … COMMIT ──► drop  │
//! │  reserve(p1, A)            ──►   waits …                                │
//! │  transfer(p1, B → A)       ──► lock (p1,A) then (p1,B)  (sorted)        │
//! │  transfer(p1, A → B)       ──► lock (p1,A) then (p1,B)  (same order)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Locks are always taken before a pooled connection is acquired, so a task
//! never holds a connection while waiting for a key.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// `(product_id, location_id)`.
pub type StockKey = (String, String);

type LockMap = DashMap<StockKey, Arc<Mutex<()>>>;

/// Lock table shared by every clone of the service.
///
/// Entries exist only while some task holds or waits on the key; the last
/// guard out removes it.
#[derive(Debug, Default)]
pub struct StockLocks {
    locks: Arc<LockMap>,
}

/// Holds one or more key locks; released on drop.
#[derive(Debug)]
pub struct StockGuard {
    locks: Arc<LockMap>,
    held: Vec<(StockKey, OwnedMutexGuard<()>)>,
}

impl StockLocks {
    pub fn new() -> Self {
        StockLocks::default()
    }

    /// Locks a single pair.
    pub async fn lock(&self, product_id: &str, location_id: &str) -> StockGuard {
        self.lock_all(vec![(product_id.to_string(), location_id.to_string())])
            .await
    }

    /// Locks every key in a global order so overlapping callers cannot
    /// deadlock. Duplicates are locked once.
    pub async fn lock_all(&self, mut keys: Vec<StockKey>) -> StockGuard {
        keys.sort();
        keys.dedup();

        // Built first so keys already taken are evicted if a later wait is cancelled
        let mut guard = StockGuard {
            locks: self.locks.clone(),
            held: Vec::with_capacity(keys.len()),
        };
        for key in keys {
            // Shard guard is released at the end of this statement
            let mutex = self.locks.entry(key.clone()).or_default().clone();
            let held = mutex.lock_owned().await;
            guard.held.push((key, held));
        }

        guard
    }

    /// Number of keys currently held or waited on.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl Drop for StockGuard {
    fn drop(&mut self) {
        for (key, held) in self.held.drain(..) {
            drop(held);
            // Only the map's own reference left: nobody holds or waits.
            // Waiters clone under the same shard lock, so the count is stable.
            self.locks.remove_if(&key, |_, mutex| Arc::strong_count(mutex) == 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn key(p: &str, l: &str) -> StockKey {
        (p.to_string(), l.to_string())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_same_key_is_exclusive() {
        let locks = Arc::new(StockLocks::new());
        let counter = Arc::new(std::sync::Mutex::new((0u32, 0u32))); // (inside, max_inside)

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let counter = counter.clone();
            tasks.push(tokio::spawn(async move {
                let _guard = locks.lock("p1", "A").await;
                {
                    let mut c = counter.lock().unwrap();
                    c.0 += 1;
                    c.1 = c.1.max(c.0);
                }
                tokio::time::sleep(Duration::from_millis(2)).await;
                counter.lock().unwrap().0 -= 1;
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(counter.lock().unwrap().1, 1);
        assert!(locks.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_opposite_order_does_not_deadlock() {
        let locks = Arc::new(StockLocks::new());

        let mut tasks = Vec::new();
        for i in 0..20 {
            let locks = locks.clone();
            tasks.push(tokio::spawn(async move {
                let keys = if i % 2 == 0 {
                    vec![key("p1", "A"), key("p1", "B")]
                } else {
                    vec![key("p1", "B"), key("p1", "A")]
                };
                let _guard = locks.lock_all(keys).await;
                tokio::task::yield_now().await;
            }));
        }

        let all = async {
            for task in tasks {
                task.await.unwrap();
            }
        };
        tokio::time::timeout(Duration::from_secs(5), all)
            .await
            .expect("transfers in opposite directions deadlocked");
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = StockLocks::new();
        let _a = locks.lock("p1", "A").await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.lock("p1", "B")).await;
        assert!(b.is_ok());

        // Duplicate keys lock once instead of self-deadlocking
        let dup = tokio::time::timeout(
            Duration::from_millis(100),
            locks.lock_all(vec![key("p2", "A"), key("p2", "A")]),
        )
        .await;
        assert!(dup.is_ok());
    }

    #[tokio::test]
    async fn test_released_keys_are_evicted() {
        let locks = StockLocks::new();

        let first = locks.lock("p1", "A").await;
        let pair = locks.lock_all(vec![key("p1", "B"), key("p1", "C")]).await;
        assert_eq!(locks.len(), 3);

        drop(first);
        assert_eq!(locks.len(), 2);
        drop(pair);
        assert!(locks.is_empty());

        for i in 0..100 {
            let _guard = locks.lock(&format!("ghost-{i}"), "nowhere").await;
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_waiter_keeps_entry_alive() {
        let locks = Arc::new(StockLocks::new());
        let held = locks.lock("p1", "A").await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock("p1", "A").await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Holder leaves while the waiter is queued; the entry must survive
        drop(held);
        assert_eq!(locks.len(), 1);

        waiter.await.unwrap();
        assert!(locks.is_empty());
    }
}
