//! In-memory store implementation.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use itemstore_core::{AttributeMap, Condition, ItemKey, ItemStore, StoreError};

/// Rows keyed by (object type, id), so a partition is a contiguous range
/// ordered by id like a DynamoDB query result.
type Rows = BTreeMap<(String, String), AttributeMap>;

/// In-memory storage backend for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    rows: Arc<RwLock<Rows>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent operation fail with
    /// [`StoreError::ConnectionFailed`] until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored rows across all partitions.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::ConnectionFailed(
                "in-memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

fn row_key(key: &ItemKey) -> (String, String) {
    (key.object_type().to_string(), key.id().to_string())
}

#[async_trait]
impl ItemStore for InMemoryStore {
    async fn put_item(
        &self,
        item: AttributeMap,
        condition: Option<Condition>,
    ) -> Result<(), StoreError> {
        self.check_available()?;

        let key = ItemKey::from_attributes(&item).map_err(|e| StoreError::Service {
            operation: "PutItem",
            message: e.to_string(),
        })?;
        let row_key = row_key(&key);

        let mut rows = self.rows.write().await;
        if let Some(condition) = condition {
            if !condition.evaluate(rows.get(&row_key)) {
                return Err(StoreError::ConditionalCheckFailed);
            }
        }
        rows.insert(row_key, item);
        Ok(())
    }

    async fn get_item(&self, key: &ItemKey) -> Result<Option<AttributeMap>, StoreError> {
        self.check_available()?;

        let rows = self.rows.read().await;
        Ok(rows.get(&row_key(key)).cloned())
    }

    async fn delete_item(
        &self,
        key: &ItemKey,
        condition: Option<Condition>,
    ) -> Result<(), StoreError> {
        self.check_available()?;

        let row_key = row_key(key);
        let mut rows = self.rows.write().await;
        if let Some(condition) = condition {
            if !condition.evaluate(rows.get(&row_key)) {
                return Err(StoreError::ConditionalCheckFailed);
            }
        }
        rows.remove(&row_key);
        Ok(())
    }

    async fn query(&self, object_type: &str) -> Result<Vec<AttributeMap>, StoreError> {
        self.check_available()?;

        let rows = self.rows.read().await;
        Ok(rows
            .range((object_type.to_string(), String::new())..)
            .take_while(|((partition, _), _)| partition == object_type)
            .map(|(_, item)| item.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itemstore_core::AttributeValue;

    fn row(id: &str, object_type: &str) -> AttributeMap {
        let mut item = ItemKey::new(id, object_type).unwrap().to_attributes();
        item.insert("name".to_string(), AttributeValue::from("Ann"));
        item
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = InMemoryStore::new();
        let key = ItemKey::new("u1", "User").unwrap();

        store.put_item(row("u1", "User"), None).await.unwrap();
        let fetched = store.get_item(&key).await.unwrap().unwrap();
        assert_eq!(fetched.get("name"), Some(&AttributeValue::from("Ann")));

        store.delete_item(&key, None).await.unwrap();
        assert!(store.get_item(&key).await.unwrap().is_none());

        // Deleting again is fine.
        store.delete_item(&key, None).await.unwrap();
    }

    #[tokio::test]
    async fn test_put_requires_key_attributes() {
        let store = InMemoryStore::new();
        let result = store.put_item(AttributeMap::new(), None).await;
        assert!(matches!(result, Err(StoreError::Service { .. })));
    }

    #[tokio::test]
    async fn test_query_is_scoped_to_partition_and_sorted() {
        let store = InMemoryStore::new();
        store.put_item(row("b", "User"), None).await.unwrap();
        store.put_item(row("a", "User"), None).await.unwrap();
        store.put_item(row("a", "Group"), None).await.unwrap();
        store.put_item(row("z", "UserX"), None).await.unwrap();

        let users = store.query("User").await.unwrap();
        let ids: Vec<_> = users
            .iter()
            .map(|item| item.get("Id").unwrap().as_s().unwrap())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);

        assert!(store.query("Nothing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_conditional_put_rejected_leaves_row() {
        let store = InMemoryStore::new();
        let key = ItemKey::new("k", "OBJECTLOCK").unwrap();
        let mut first = key.to_attributes();
        first.insert("ExpiresAt".to_string(), AttributeValue::from(200_i64));
        store
            .put_item(first.clone(), Some(Condition::LockAvailable { now: 100 }))
            .await
            .unwrap();

        let mut second = key.to_attributes();
        second.insert("ExpiresAt".to_string(), AttributeValue::from(300_i64));
        let result = store
            .put_item(second, Some(Condition::LockAvailable { now: 150 }))
            .await;

        assert_eq!(result, Err(StoreError::ConditionalCheckFailed));
        assert_eq!(store.get_item(&key).await.unwrap(), Some(first));
    }

    #[tokio::test]
    async fn test_conditional_delete() {
        let store = InMemoryStore::new();
        let key = ItemKey::new("k", "OBJECTLOCK").unwrap();
        let mut item = key.to_attributes();
        item.insert("LockId".to_string(), AttributeValue::from("a"));
        store.put_item(item, None).await.unwrap();

        let wrong = Condition::LockHeldBy {
            lock_id: "b".to_string(),
        };
        assert_eq!(
            store.delete_item(&key, Some(wrong)).await,
            Err(StoreError::ConditionalCheckFailed)
        );

        let right = Condition::LockHeldBy {
            lock_id: "a".to_string(),
        };
        store.delete_item(&key, Some(right.clone())).await.unwrap();
        assert!(store.is_empty().await);

        assert_eq!(
            store.delete_item(&key, Some(right)).await,
            Err(StoreError::ConditionalCheckFailed)
        );
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_operation() {
        let store = InMemoryStore::new();
        let key = ItemKey::new("u1", "User").unwrap();
        store.set_unavailable(true);

        assert!(matches!(
            store.put_item(row("u1", "User"), None).await,
            Err(StoreError::ConnectionFailed(_))
        ));
        assert!(store.get_item(&key).await.is_err());
        assert!(store.delete_item(&key, None).await.is_err());
        assert!(store.query("User").await.is_err());

        store.set_unavailable(false);
        assert!(store.get_item(&key).await.unwrap().is_none());
    }
}
