//! The narrow interface every storage backend implements.

use async_trait::async_trait;
use thiserror::Error;

use crate::attribute::AttributeMap;
use crate::key::ItemKey;
use crate::lock::{EXPIRES_AT_ATTRIBUTE, LOCK_ID_ATTRIBUTE};

/// Failures reported by a storage backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The write's condition did not hold; nothing was written.
    #[error("Conditional check failed")]
    ConditionalCheckFailed,

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Throughput exceeded, please retry")]
    Throttled,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A stored value has no counterpart in the attribute model.
    #[error("Unsupported attribute: {0}")]
    UnsupportedAttribute(String),

    #[error("{operation} failed: {message}")]
    Service {
        operation: &'static str,
        message: String,
    },
}

/// Row-level predicates a backend evaluates atomically with the write.
///
/// Backends translate these into their own condition language; the
/// in-memory backend calls [`Condition::evaluate`] under its write guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// No row exists, or the row's `ExpiresAt` is strictly before `now`.
    LockAvailable { now: i64 },
    /// A row exists and its `LockId` equals `lock_id`.
    LockHeldBy { lock_id: String },
}

impl Condition {
    /// Evaluates the predicate against the current row, if any.
    ///
    /// A row lacking the compared attribute fails the comparison, matching
    /// DynamoDB's treatment of missing attributes.
    pub fn evaluate(&self, current: Option<&AttributeMap>) -> bool {
        match (self, current) {
            (Condition::LockAvailable { .. }, None) => true,
            (Condition::LockAvailable { now }, Some(row)) => row
                .get(EXPIRES_AT_ATTRIBUTE)
                .and_then(|v| v.as_i64())
                .is_some_and(|expires_at| expires_at < *now),
            (Condition::LockHeldBy { .. }, None) => false,
            (Condition::LockHeldBy { lock_id }, Some(row)) => row
                .get(LOCK_ID_ATTRIBUTE)
                .and_then(|v| v.as_s())
                .is_some_and(|current| current == lock_id),
        }
    }
}

/// Primitive operations against a table keyed by (`ObjectType`, `Id`).
///
/// Implementations must apply a conditional write atomically: the
/// condition is checked against the row as it is at write time.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Writes a full row, replacing any existing one with the same key.
    ///
    /// `item` always carries the `Id` and `ObjectType` attributes.
    async fn put_item(
        &self,
        item: AttributeMap,
        condition: Option<Condition>,
    ) -> Result<(), StoreError>;

    /// Reads a row by exact key. `None` when absent.
    async fn get_item(&self, key: &ItemKey) -> Result<Option<AttributeMap>, StoreError>;

    /// Deletes a row by exact key. Deleting an absent row is not an error
    /// unless a condition is given.
    async fn delete_item(&self, key: &ItemKey, condition: Option<Condition>)
        -> Result<(), StoreError>;

    /// Returns every row of a partition, following all result pages.
    async fn query(&self, object_type: &str) -> Result<Vec<AttributeMap>, StoreError>;
}
