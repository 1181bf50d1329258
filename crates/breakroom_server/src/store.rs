//! Session store: `game_id` to serialized session bytes.
//!
//! An entry exists exactly while its game is live. The store itself does no
//! read-modify-write; callers serialise that per key with [`KeyedLocks`].

use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, instrument};

/// Keyed persistence for serialized sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Bytes stored under `key`; `Ok(None)` when there are none.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Removes `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Whether `key` has a value.
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;
}

/// In-process [`SessionStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether no session is live.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let value = self.entries.read().await.get(key).cloned();
        debug!(found = value.is_some(), "Session lookup");
        Ok(value)
    }

    #[instrument(skip(self, value), fields(len = value.len()))]
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.entries.write().await.insert(key.to_string(), value);
        debug!("Session stored");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let removed = self.entries.write().await.remove(key).is_some();
        debug!(removed, "Session deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.entries.read().await.contains_key(key))
    }
}

/// One async mutex per key.
///
/// Holding the guard from [`KeyedLocks::lock`] excludes every other holder of
/// the same key; different keys never block each other. Idle entries are
/// pruned on the next call to `lock`.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

/// Guard returned by [`KeyedLocks::lock`]; the key unlocks on drop.
#[derive(Debug)]
pub struct KeyGuard {
    _guard: OwnedMutexGuard<()>,
}

impl KeyedLocks {
    /// Creates an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `key`.
    #[instrument(skip(self))]
    pub async fn lock(&self, key: &str) -> KeyGuard {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(
                locks
                    .entry(key.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        let guard = lock.lock_owned().await;
        debug!("Key locked");
        KeyGuard { _guard: guard }
    }

    /// Keys with a holder or waiter.
    pub async fn active(&self) -> usize {
        self.locks
            .lock()
            .await
            .values()
            .filter(|lock| Arc::strong_count(lock) > 1)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get("nope").await.unwrap(), None);
        assert!(!store.exists("nope").await.unwrap());
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryStore::new();
        store.put("g1", b"one".to_vec()).await.unwrap();
        store.put("g1", b"two".to_vec()).await.unwrap();
        assert_eq!(store.get("g1").await.unwrap(), Some(b"two".to_vec()));
        assert_eq!(store.len().await, 1);

        store.delete("g1").await.unwrap();
        assert!(!store.exists("g1").await.unwrap());
        store.delete("g1").await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let locks = Arc::new(KeyedLocks::new());
        let guard = locks.lock("g1").await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.lock("g1").await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let _g1 = locks.lock("g1").await;
        tokio::time::timeout(Duration::from_secs(1), locks.lock("g2"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_idle_keys_pruned() {
        let locks = KeyedLocks::new();
        drop(locks.lock("g1").await);
        drop(locks.lock("g2").await);
        let _g3 = locks.lock("g3").await;
        assert_eq!(locks.active().await, 1);
        assert_eq!(locks.locks.lock().await.len(), 1);
    }
}
