//! The public entry point: item operations plus lease locks on one store.

use std::sync::Arc;
use std::time::Duration;

use itemstore_core::{ItemKey, ItemLock, ItemStore, Result, StoredItem, DEFAULT_LEASE_DURATION};

use crate::adapter::ItemAdapter;
use crate::lock::LockManager;

#[cfg(feature = "dynamodb")]
use crate::{config::RepositoryConfig, storage::dynamodb::DynamoDbStore};

/// Item repository backed by an [`ItemStore`].
///
/// Cloning is cheap; clones share the same store.
pub struct Repository<S> {
    store: Arc<S>,
    adapter: ItemAdapter<S>,
    locks: LockManager<S>,
}

impl<S> Clone for Repository<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            adapter: self.adapter.clone(),
            locks: self.locks.clone(),
        }
    }
}

impl<S: ItemStore> Repository<S> {
    /// Creates a repository with the default 5 minute lease.
    pub fn new(store: S) -> Self {
        Self::with_lease_duration(store, DEFAULT_LEASE_DURATION)
    }

    pub fn with_lease_duration(store: S, lease_duration: Duration) -> Self {
        let store = Arc::new(store);
        let adapter = ItemAdapter::new(Arc::clone(&store));
        let locks = LockManager::new(adapter.clone(), lease_duration);
        Self {
            store,
            adapter,
            locks,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn lease_duration(&self) -> Duration {
        self.locks.lease_duration()
    }

    /// Creates or replaces `entity`.
    pub async fn add<T: StoredItem>(&self, entity: &T) -> Result<()> {
        self.adapter.add(entity).await
    }

    /// Loads the entity stored at `key`.
    pub async fn get<T: StoredItem>(&self, key: &ItemKey) -> Result<T> {
        self.adapter.get(key).await
    }

    /// Reloads `entity` in place from its own key.
    pub async fn get_into<T: StoredItem>(&self, entity: &mut T) -> Result<()> {
        self.adapter.get_into(entity).await
    }

    pub async fn delete(&self, key: &ItemKey) -> Result<()> {
        self.adapter.delete(key).await
    }

    /// Lists every entity of `object_type`.
    pub async fn query<T: StoredItem>(&self, object_type: &str) -> Result<Vec<T>> {
        self.adapter.query(object_type).await
    }

    pub async fn query_into<T: StoredItem>(
        &self,
        object_type: &str,
        items: &mut Vec<T>,
    ) -> Result<()> {
        self.adapter.query_into(object_type, items).await
    }

    /// Takes an exclusive lease on `item`.
    pub async fn lock(&self, item: &ItemKey) -> Result<ItemLock> {
        self.locks.lock(item).await
    }

    /// Extends a held lease in place.
    pub async fn renew(&self, lock: &mut ItemLock) -> Result<ItemLock> {
        self.locks.renew(lock).await
    }

    /// Removes the lock row whoever holds it.
    pub async fn unlock(&self, lock: &ItemLock) -> Result<()> {
        self.locks.unlock(lock).await
    }

    /// Removes the lock row if `lock` still holds it.
    pub async fn release(&self, lock: &ItemLock) -> Result<()> {
        self.locks.release(lock).await
    }
}

#[cfg(feature = "dynamodb")]
impl Repository<DynamoDbStore> {
    /// Creates a DynamoDB-backed repository. No connection is made until
    /// the first operation.
    pub fn dynamodb(config: RepositoryConfig) -> Self {
        let lease_duration = config.lease_duration();
        Self::with_lease_duration(DynamoDbStore::new(&config), lease_duration)
    }
}
