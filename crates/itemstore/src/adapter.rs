//! Typed item operations over an [`ItemStore`].
//!
//! The adapter marshals entities through [`StoredItem`], issues one store
//! call per operation and turns backend failures into [`RepositoryError`]s
//! carrying the operation name and the offending key.

use std::sync::Arc;

use itemstore_core::{
    to_item, Condition, ItemKey, ItemStore, RepositoryError, Result, StoreError, StoredItem,
    LOCK_OBJECT_TYPE,
};

/// Generic marshal/unmarshal layer shared by the facade and the lock manager.
pub struct ItemAdapter<S> {
    store: Arc<S>,
}

impl<S> Clone for ItemAdapter<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: ItemStore> ItemAdapter<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Upserts `entity`. Last writer wins.
    ///
    /// Lock rows can only be written through the lock manager.
    pub async fn add<T: StoredItem>(&self, entity: &T) -> Result<()> {
        let key = entity.item_key();
        tracing::debug!(key = %key, "Adding item");

        if key.object_type() == LOCK_OBJECT_TYPE {
            return Err(RepositoryError::ReservedObjectType {
                object_type: key.object_type().to_string(),
            });
        }

        let item = to_item(entity)?;
        self.store
            .put_item(item, None)
            .await
            .map_err(|e| write_error("PutItem", &key.address(), e))
    }

    /// Fetches the row at `key` and decodes it into a new `T`.
    pub async fn get<T: StoredItem>(&self, key: &ItemKey) -> Result<T> {
        tracing::debug!(key = %key, "Getting item");

        let item = self
            .store
            .get_item(key)
            .await
            .map_err(|e| read_error("GetItem", &key.address(), e))?;

        let item = match item {
            Some(item) if !item.is_empty() => item,
            _ => {
                tracing::info!(key = %key, "Item not found");
                return Err(RepositoryError::NotFound {
                    key: key.address(),
                });
            }
        };

        let entity = T::from_attributes(&item)?;
        if entity.item_key() != key {
            return Err(RepositoryError::InvalidTarget {
                key: key.address(),
                reason: format!("decoded item has key {}", entity.item_key()),
            });
        }
        Ok(entity)
    }

    /// Reloads `entity` in place from the row at its own key.
    ///
    /// `entity` is left untouched on error.
    pub async fn get_into<T: StoredItem>(&self, entity: &mut T) -> Result<()> {
        let key = entity.item_key().clone();
        *entity = self.get(&key).await?;
        Ok(())
    }

    /// Deletes the row at `key`. Deleting an absent row succeeds.
    pub async fn delete(&self, key: &ItemKey) -> Result<()> {
        tracing::debug!(key = %key, "Deleting item");

        self.store
            .delete_item(key, None)
            .await
            .map_err(|e| write_error("DeleteItem", &key.address(), e))
    }

    /// Returns every item stored under `object_type`.
    pub async fn query<T: StoredItem>(&self, object_type: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        self.query_into(object_type, &mut items).await?;
        Ok(items)
    }

    /// Appends every item stored under `object_type` to `items`.
    ///
    /// Nothing is appended unless every row decodes.
    pub async fn query_into<T: StoredItem>(
        &self,
        object_type: &str,
        items: &mut Vec<T>,
    ) -> Result<()> {
        tracing::debug!(object_type, "Querying items");

        let rows = self
            .store
            .query(object_type)
            .await
            .map_err(|e| read_error("Query", object_type, e))?;

        let mut decoded = Vec::with_capacity(rows.len());
        for row in &rows {
            let entity = T::from_attributes(row)?;
            if entity.item_key().object_type() != object_type {
                return Err(RepositoryError::InvalidTarget {
                    key: object_type.to_string(),
                    reason: format!("decoded item has key {}", entity.item_key()),
                });
            }
            decoded.push(entity);
        }

        tracing::debug!(object_type, count = decoded.len(), "Query complete");
        items.extend(decoded);
        Ok(())
    }

    /// Writes `entity` only if `condition` holds. Skips the reserved
    /// object type guard.
    pub(crate) async fn put_conditional<T: StoredItem>(
        &self,
        entity: &T,
        condition: Condition,
    ) -> Result<()> {
        let key = entity.item_key();
        tracing::debug!(key = %key, ?condition, "Conditional put");

        let item = to_item(entity)?;
        self.store
            .put_item(item, Some(condition))
            .await
            .map_err(|e| write_error("PutItem", &key.address(), e))
    }

    /// Deletes the row at `key` only if `condition` holds.
    pub(crate) async fn delete_conditional(&self, key: &ItemKey, condition: Condition) -> Result<()> {
        tracing::debug!(key = %key, ?condition, "Conditional delete");

        self.store
            .delete_item(key, Some(condition))
            .await
            .map_err(|e| write_error("DeleteItem", &key.address(), e))
    }
}

/// True when a write was rejected by its condition.
pub(crate) fn is_condition_failure(err: &RepositoryError) -> bool {
    matches!(err.store_error(), Some(StoreError::ConditionalCheckFailed))
}

fn read_error(operation: &'static str, key: &str, err: StoreError) -> RepositoryError {
    match err {
        StoreError::UnsupportedAttribute(message) => RepositoryError::Serialization(message),
        source => {
            tracing::error!(operation, key, error = %source, "Store read failed");
            RepositoryError::StoreRead {
                operation,
                key: key.to_string(),
                source,
            }
        }
    }
}

fn write_error(operation: &'static str, key: &str, err: StoreError) -> RepositoryError {
    match err {
        StoreError::ConditionalCheckFailed => {
            tracing::info!(operation, key, "Conditional write rejected");
        }
        ref source => {
            tracing::error!(operation, key, error = %source, "Store write failed");
        }
    }
    RepositoryError::StoreWrite {
        operation,
        key: key.to_string(),
        source: err,
    }
}
