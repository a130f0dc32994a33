//! DynamoDB store implementation.
//!
//! Implements `ItemStore` from `itemstore_core` on a single table keyed by
//! `ObjectType` (partition) and `Id` (sort).

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue as DynamoValue;
use aws_sdk_dynamodb::Client;
use tokio::sync::OnceCell;

use itemstore_core::key::{ID_ATTRIBUTE, OBJECT_TYPE_ATTRIBUTE};
use itemstore_core::{AttributeMap, Condition, ItemKey, ItemStore, StoreError};

use super::conversions::{from_dynamo_item, to_dynamo_item, to_dynamo_value};
use super::error::{map_delete_item_error, map_get_item_error, map_put_item_error, map_query_error};
use super::expressions::{condition_expression, partition_key_condition, Expression};
use crate::config::RepositoryConfig;

/// DynamoDB-based store.
///
/// The SDK client is built on first use and reused for the lifetime of the
/// store. Concurrent first callers wait on the same initialization.
#[derive(Debug)]
pub struct DynamoDbStore {
    table_name: String,
    region: String,
    endpoint_url: Option<String>,
    client: OnceCell<Client>,
}

impl DynamoDbStore {
    /// Creates a store that will connect lazily using `config`.
    pub fn new(config: &RepositoryConfig) -> Self {
        Self {
            table_name: config.table_name.clone(),
            region: config.region.clone(),
            endpoint_url: config.endpoint_url.clone(),
            client: OnceCell::new(),
        }
    }

    /// Creates a store around an already built client.
    pub fn with_client(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            region: client
                .config()
                .region()
                .map(|r| r.to_string())
                .unwrap_or_default(),
            endpoint_url: None,
            client: OnceCell::from(client),
        }
    }

    /// Get the table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// True once the SDK client exists.
    pub fn is_connected(&self) -> bool {
        self.client.initialized()
    }

    async fn client(&self) -> &Client {
        self.client
            .get_or_init(|| async {
                tracing::debug!(
                    region = %self.region,
                    endpoint = ?self.endpoint_url,
                    "Creating DynamoDB client"
                );
                create_client(&self.region, self.endpoint_url.as_deref()).await
            })
            .await
    }
}

/// Creates a DynamoDB client for the given region and optional endpoint.
pub async fn create_client(region: &str, endpoint_url: Option<&str>) -> Client {
    let mut sdk_config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(region.to_string()));

    if let Some(endpoint) = endpoint_url {
        sdk_config_loader = sdk_config_loader.endpoint_url(endpoint);
    }

    let sdk_config = sdk_config_loader.load().await;
    Client::new(&sdk_config)
}

fn key_attributes(key: &ItemKey) -> HashMap<String, DynamoValue> {
    HashMap::from([
        (
            OBJECT_TYPE_ATTRIBUTE.to_string(),
            DynamoValue::S(key.object_type().to_string()),
        ),
        (ID_ATTRIBUTE.to_string(), DynamoValue::S(key.id().to_string())),
    ])
}

fn expression_values(expr: Expression) -> HashMap<String, DynamoValue> {
    expr.values
        .into_iter()
        .map(|(k, v)| (k, to_dynamo_value(v)))
        .collect()
}

#[async_trait]
impl ItemStore for DynamoDbStore {
    async fn put_item(
        &self,
        item: AttributeMap,
        condition: Option<Condition>,
    ) -> Result<(), StoreError> {
        let mut request = self
            .client()
            .await
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(to_dynamo_item(item)));

        if let Some(condition) = condition {
            let expr = condition_expression(&condition);
            request = request
                .condition_expression(expr.expression.clone())
                .set_expression_attribute_names(Some(expr.names.clone()))
                .set_expression_attribute_values(Some(expression_values(expr)));
        }

        request
            .send()
            .await
            .map_err(|e| map_put_item_error(e, &self.table_name))?;

        Ok(())
    }

    async fn get_item(&self, key: &ItemKey) -> Result<Option<AttributeMap>, StoreError> {
        let result = self
            .client()
            .await
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(key_attributes(key)))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| map_get_item_error(e, &self.table_name))?;

        match result.item {
            Some(item) if !item.is_empty() => Ok(Some(from_dynamo_item(item)?)),
            _ => Ok(None),
        }
    }

    async fn delete_item(
        &self,
        key: &ItemKey,
        condition: Option<Condition>,
    ) -> Result<(), StoreError> {
        let mut request = self
            .client()
            .await
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(key_attributes(key)));

        if let Some(condition) = condition {
            let expr = condition_expression(&condition);
            request = request
                .condition_expression(expr.expression.clone())
                .set_expression_attribute_names(Some(expr.names.clone()))
                .set_expression_attribute_values(Some(expression_values(expr)));
        }

        request
            .send()
            .await
            .map_err(|e| map_delete_item_error(e, &self.table_name))?;

        Ok(())
    }

    async fn query(&self, object_type: &str) -> Result<Vec<AttributeMap>, StoreError> {
        let client = self.client().await;
        let expr = partition_key_condition(object_type);
        let names = expr.names.clone();
        let key_condition = expr.expression.clone();
        let values = expression_values(expr);

        let mut items = Vec::new();
        let mut exclusive_start_key = None;
        loop {
            let result = client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression(&key_condition)
                .set_expression_attribute_names(Some(names.clone()))
                .set_expression_attribute_values(Some(values.clone()))
                .consistent_read(true)
                .set_exclusive_start_key(exclusive_start_key.take())
                .send()
                .await
                .map_err(|e| map_query_error(e, &self.table_name))?;

            for item in result.items.unwrap_or_default() {
                items.push(from_dynamo_item(item)?);
            }

            match result.last_evaluated_key {
                Some(key) if !key.is_empty() => {
                    tracing::trace!(object_type, fetched = items.len(), "Fetching next query page");
                    exclusive_start_key = Some(key);
                }
                _ => break,
            }
        }

        Ok(items)
    }
}

/// These run against DynamoDB Local through `cargo xtask integration`,
/// which creates the table and sets `AWS_ENDPOINT_URL`,
/// `DYNAMODB_TABLE_NAME` and dummy credentials.
#[cfg(test)]
mod integration_tests {
    use std::time::Duration;

    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    use itemstore_core::attribute::{from_attribute_map, to_attribute_map};
    use itemstore_core::{ItemLock, RepositoryError, Result, StoredItem};

    use super::*;
    use crate::Repository;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestItem {
        #[serde(flatten)]
        key: ItemKey,
        val1: String,
        val2: i64,
    }

    impl StoredItem for TestItem {
        fn item_key(&self) -> &ItemKey {
            &self.key
        }

        fn to_attributes(&self) -> Result<AttributeMap> {
            Ok(to_attribute_map(self)?)
        }

        fn from_attributes(item: &AttributeMap) -> Result<Self> {
            Ok(from_attribute_map(item)?)
        }
    }

    fn new_item(object_type: &str) -> TestItem {
        TestItem {
            key: ItemKey::new(Uuid::new_v4().to_string(), object_type).unwrap(),
            val1: "xXx".to_string(),
            val2: 123_445_667,
        }
    }

    fn repository() -> Repository<DynamoDbStore> {
        Repository::dynamodb(RepositoryConfig::from_env())
    }

    #[tokio::test]
    #[ignore = "requires DynamoDB Local (cargo xtask integration)"]
    async fn test_crud_actions() {
        let repo = repository();
        let mut item = new_item("TestItems");

        repo.add(&item).await.unwrap();
        assert!(repo.store().is_connected());
        let fetched: TestItem = repo.get(item.item_key()).await.unwrap();
        assert_eq!(fetched, item);

        item.val1 = "yYy".to_string();
        item.val2 = 9_887_654;
        repo.add(&item).await.unwrap();
        let fetched: TestItem = repo.get(item.item_key()).await.unwrap();
        assert_eq!(fetched, item);

        repo.delete(item.item_key()).await.unwrap();
        let err = repo.get::<TestItem>(item.item_key()).await.unwrap_err();
        assert!(err.is_not_found());
        repo.delete(item.item_key()).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires DynamoDB Local (cargo xtask integration)"]
    async fn test_query_items() {
        let repo = repository();
        let object_type = format!("QueryItems-{}", Uuid::new_v4());
        for _ in 0..3 {
            repo.add(&new_item(&object_type)).await.unwrap();
        }

        let items: Vec<TestItem> = repo.query(&object_type).await.unwrap();
        assert_eq!(items.len(), 3);

        let empty: Vec<TestItem> = repo.query("NoSuchType").await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    #[ignore = "requires DynamoDB Local (cargo xtask integration)"]
    async fn test_object_lock() {
        let repo = repository();
        let item = new_item("TestItems");

        let mut lock = repo.lock(item.item_key()).await.unwrap();
        let expires_at = lock.expires_at();

        tokio::time::sleep(Duration::from_secs(1)).await;
        repo.renew(&mut lock).await.unwrap();
        assert!(lock.expires_at() > expires_at);

        let mut tampered = lock.with_lock_id(Uuid::new_v4().to_string());
        let err = repo.renew(&mut tampered).await.unwrap_err();
        assert!(matches!(err, RepositoryError::LockNotHeld { .. }));

        let err = repo.lock(item.item_key()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::AlreadyLocked { .. }));

        repo.unlock(&lock).await.unwrap();
        assert!(repo.renew(&mut lock).await.is_err());

        let relocked: ItemLock = repo.lock(item.item_key()).await.unwrap();
        repo.release(&relocked).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires DynamoDB Local (cargo xtask integration)"]
    async fn test_lock_after_expiration() {
        let config = RepositoryConfig::from_env().with_lease_duration(Duration::from_secs(1));
        let repo = Repository::dynamodb(config);
        let item = new_item("TestItems");

        let first = repo.lock(item.item_key()).await.unwrap();
        assert!(repo.lock(item.item_key()).await.is_err());

        tokio::time::sleep(Duration::from_secs(3)).await;
        let second = repo.lock(item.item_key()).await.unwrap();
        assert_ne!(first.lock_id(), second.lock_id());
        repo.unlock(&second).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires DynamoDB Local (cargo xtask integration)"]
    async fn test_missing_table_is_a_store_error() {
        let config = RepositoryConfig::from_env().with_table_name("no-such-table");
        let repo = Repository::dynamodb(config);
        let item = new_item("TestItems");

        let err = repo.get::<TestItem>(item.item_key()).await.unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::StoreRead {
                source: StoreError::TableNotFound(_),
                ..
            }
        ));
    }
}
