//! Lease-based locks on items.
//!
//! Every acquisition, renewal and owner-checked release is a single
//! conditional write evaluated by the store. The manager keeps no state
//! between calls.

use std::time::Duration;

use chrono::Utc;

use itemstore_core::lock::lease_expiration;
use itemstore_core::{
    Condition, ItemKey, ItemLock, ItemStore, RepositoryError, Result, StoredItem,
    LOCK_OBJECT_TYPE,
};

use crate::adapter::{is_condition_failure, ItemAdapter};

/// Acquires, renews and releases [`ItemLock`]s.
pub struct LockManager<S> {
    adapter: ItemAdapter<S>,
    lease_duration: Duration,
}

impl<S> Clone for LockManager<S> {
    fn clone(&self) -> Self {
        Self {
            adapter: self.adapter.clone(),
            lease_duration: self.lease_duration,
        }
    }
}

impl<S: ItemStore> LockManager<S> {
    pub fn new(adapter: ItemAdapter<S>, lease_duration: Duration) -> Self {
        Self {
            adapter,
            lease_duration,
        }
    }

    pub fn lease_duration(&self) -> Duration {
        self.lease_duration
    }

    /// Takes the lease on `item`.
    ///
    /// Succeeds when no lock row exists or the existing lease has expired.
    /// A live lease held by anyone, the caller included, is `AlreadyLocked`.
    pub async fn lock(&self, item: &ItemKey) -> Result<ItemLock> {
        tracing::debug!(key = %item, "Acquiring lock");

        let now = Utc::now();
        let lock = ItemLock::for_item(item, lease_expiration(now, self.lease_duration))?;
        let condition = Condition::LockAvailable {
            now: now.timestamp(),
        };

        match self.adapter.put_conditional(&lock, condition).await {
            Ok(()) => {
                tracing::debug!(key = %item, expires_at = lock.expires_at(), "Lock acquired");
                Ok(lock)
            }
            Err(err) if is_condition_failure(&err) => {
                tracing::info!(key = %item, "Item is already locked");
                Err(RepositoryError::AlreadyLocked {
                    key: lock.key().address(),
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Extends a held lease.
    ///
    /// On success `lock` carries the new expiry and a copy is returned. When
    /// the lock row is gone or belongs to another holder, `lock` is left
    /// untouched and `LockNotHeld` is returned.
    pub async fn renew(&self, lock: &mut ItemLock) -> Result<ItemLock> {
        tracing::debug!(key = %lock.key(), "Renewing lock");
        ensure_lock_row(lock)?;

        let renewed = lock.with_expires_at(lease_expiration(Utc::now(), self.lease_duration));
        let condition = held_by(lock);

        match self.adapter.put_conditional(&renewed, condition).await {
            Ok(()) => {
                *lock = renewed.clone();
                Ok(renewed)
            }
            Err(err) if is_condition_failure(&err) => {
                tracing::info!(key = %lock.key(), "Lock is not held");
                Err(RepositoryError::LockNotHeld {
                    key: lock.key().address(),
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Deletes the lock row without checking who holds it.
    pub async fn unlock(&self, lock: &ItemLock) -> Result<()> {
        tracing::debug!(key = %lock.key(), "Unlocking");
        ensure_lock_row(lock)?;

        self.adapter.delete(lock.key()).await
    }

    /// Deletes the lock row only while `lock` still holds it.
    pub async fn release(&self, lock: &ItemLock) -> Result<()> {
        tracing::debug!(key = %lock.key(), "Releasing lock");
        ensure_lock_row(lock)?;

        match self
            .adapter
            .delete_conditional(lock.key(), held_by(lock))
            .await
        {
            Err(err) if is_condition_failure(&err) => {
                tracing::info!(key = %lock.key(), "Lock is not held");
                Err(RepositoryError::LockNotHeld {
                    key: lock.key().address(),
                })
            }
            other => other,
        }
    }
}

fn held_by(lock: &ItemLock) -> Condition {
    Condition::LockHeldBy {
        lock_id: lock.lock_id().to_string(),
    }
}

/// Locks decoded from outside input could name any row.
fn ensure_lock_row(lock: &ItemLock) -> Result<()> {
    if lock.item_key().object_type() != LOCK_OBJECT_TYPE {
        return Err(RepositoryError::InvalidTarget {
            key: lock.key().address(),
            reason: format!("lock rows live under {LOCK_OBJECT_TYPE}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use itemstore_core::StoreError;

    use super::*;
    use crate::storage::inmemory::InMemoryStore;

    fn manager(lease: Duration) -> (LockManager<InMemoryStore>, InMemoryStore) {
        let store = InMemoryStore::new();
        let adapter = ItemAdapter::new(Arc::new(store.clone()));
        (LockManager::new(adapter, lease), store)
    }

    fn item() -> ItemKey {
        ItemKey::new("u1", "User").unwrap()
    }

    #[tokio::test]
    async fn test_lock_creates_lock_row() {
        let (locks, store) = manager(Duration::from_secs(300));
        let before = Utc::now().timestamp();

        let lock = locks.lock(&item()).await.unwrap();

        assert_eq!(lock.key().id(), "u1:User");
        assert_eq!(lock.key().object_type(), "OBJECTLOCK");
        assert!(lock.expires_at() >= before + 300);
        assert!(!lock.lock_id().is_empty());

        let row = store.get_item(lock.key()).await.unwrap().unwrap();
        assert_eq!(ItemLock::from_attributes(&row).unwrap(), lock);
    }

    #[tokio::test]
    async fn test_second_lock_is_rejected() {
        let (locks, _) = manager(Duration::from_secs(300));
        locks.lock(&item()).await.unwrap();

        let err = locks.lock(&item()).await.unwrap_err();

        assert_eq!(
            err,
            RepositoryError::AlreadyLocked {
                key: "u1:User:OBJECTLOCK".to_string()
            }
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_lock_has_one_winner() {
        let (locks, _) = manager(Duration::from_secs(300));

        let attempts: Vec<_> = (0..8)
            .map(|_| {
                let locks = locks.clone();
                tokio::spawn(async move { locks.lock(&item()).await })
            })
            .collect();

        let mut acquired = 0;
        let mut rejected = 0;
        for attempt in attempts {
            match attempt.await.unwrap() {
                Ok(_) => acquired += 1,
                Err(RepositoryError::AlreadyLocked { .. }) => rejected += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(acquired, 1);
        assert_eq!(rejected, 7);
    }

    #[tokio::test]
    async fn test_expired_lease_can_be_taken_over() {
        let (locks, _) = manager(Duration::from_secs(1));
        let first = locks.lock(&item()).await.unwrap();

        tokio::time::sleep(Duration::from_secs(2)).await;
        let second = locks.lock(&item()).await.unwrap();

        assert_ne!(first.lock_id(), second.lock_id());
    }

    #[tokio::test]
    async fn test_renew_extends_expiry() {
        let (locks, _) = manager(Duration::from_secs(300));
        let mut lock = locks.lock(&item()).await.unwrap();
        let original = lock.expires_at();

        tokio::time::sleep(Duration::from_secs(1)).await;
        let renewed = locks.renew(&mut lock).await.unwrap();

        assert!(renewed.expires_at() > original);
        assert_eq!(lock, renewed);
    }

    #[tokio::test]
    async fn test_renew_with_tampered_lock_id_fails() {
        let (locks, _) = manager(Duration::from_secs(300));
        let lock = locks.lock(&item()).await.unwrap();
        let mut tampered = lock.with_lock_id("someone-else");
        let before = tampered.clone();

        let err = locks.renew(&mut tampered).await.unwrap_err();

        assert!(matches!(err, RepositoryError::LockNotHeld { .. }));
        assert_eq!(tampered, before);
    }

    #[tokio::test]
    async fn test_renew_after_unlock_fails() {
        let (locks, _) = manager(Duration::from_secs(300));
        let mut lock = locks.lock(&item()).await.unwrap();

        locks.unlock(&lock).await.unwrap();

        assert!(locks.renew(&mut lock).await.unwrap_err().is_contention());
    }

    #[tokio::test]
    async fn test_unlock_allows_relock() {
        let (locks, store) = manager(Duration::from_secs(300));
        let lock = locks.lock(&item()).await.unwrap();

        locks.unlock(&lock).await.unwrap();
        assert!(store.is_empty().await);

        let again = locks.lock(&item()).await.unwrap();
        assert_ne!(again.lock_id(), lock.lock_id());
    }

    #[tokio::test]
    async fn test_unlock_ignores_ownership() {
        let (locks, store) = manager(Duration::from_secs(300));
        let lock = locks.lock(&item()).await.unwrap();

        locks.unlock(&lock.with_lock_id("stranger")).await.unwrap();

        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_release_with_stale_lock_fails() {
        let (locks, store) = manager(Duration::from_secs(1));
        let stale = locks.lock(&item()).await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        let current = locks.lock(&item()).await.unwrap();

        let err = locks.release(&stale).await.unwrap_err();
        assert!(matches!(err, RepositoryError::LockNotHeld { .. }));

        let row = store.get_item(current.key()).await.unwrap().unwrap();
        assert_eq!(ItemLock::from_attributes(&row).unwrap(), current);

        locks.release(&current).await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_lock_of_non_lock_row_is_invalid_target() {
        let (locks, _) = manager(Duration::from_secs(300));
        let lock = locks.lock(&item()).await.unwrap();
        let json = serde_json::json!({
            "Id": "u1",
            "ObjectType": "User",
            "ExpiresAt": lock.expires_at(),
            "LockId": lock.lock_id(),
        });
        let forged: ItemLock = serde_json::from_value(json).unwrap();

        let err = locks.unlock(&forged).await.unwrap_err();

        assert!(matches!(err, RepositoryError::InvalidTarget { .. }));
    }

    #[tokio::test]
    async fn test_store_failure_is_not_contention() {
        let (locks, store) = manager(Duration::from_secs(300));
        store.set_unavailable(true);

        let err = locks.lock(&item()).await.unwrap_err();

        assert!(!err.is_contention());
        assert!(matches!(
            err.store_error(),
            Some(StoreError::ConnectionFailed(_))
        ));
    }
}
