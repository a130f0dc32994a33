//! Lock rows.
//!
//! A lock is an ordinary row under the reserved [`LOCK_OBJECT_TYPE`]
//! partition. Its id is the locked item's address, so there is at most one
//! lock row per locked item.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::attribute::{get_i64, get_string, AttributeMap, AttributeValue};
use crate::error::Result;
use crate::item::StoredItem;
use crate::key::{ItemKey, KeyError};

/// Object type reserved for lock rows.
pub const LOCK_OBJECT_TYPE: &str = "OBJECTLOCK";

/// Attribute holding the lease expiry, in epoch seconds.
pub const EXPIRES_AT_ATTRIBUTE: &str = "ExpiresAt";

/// Attribute holding the holder's lock id.
pub const LOCK_ID_ATTRIBUTE: &str = "LockId";

/// Default lease duration (5 minutes).
pub const DEFAULT_LEASE_DURATION: Duration = Duration::from_secs(300);

/// Proof of ownership of a lease on one item.
///
/// Holding the `lock_id` is the only thing that identifies the owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemLock {
    #[serde(flatten)]
    key: ItemKey,
    #[serde(rename = "ExpiresAt")]
    expires_at: i64,
    #[serde(rename = "LockId")]
    lock_id: String,
}

impl ItemLock {
    /// Builds a fresh lock for `item` expiring at `expires_at`.
    pub fn for_item(item: &ItemKey, expires_at: i64) -> std::result::Result<Self, KeyError> {
        Ok(Self {
            key: lock_key_for(item)?,
            expires_at,
            lock_id: Uuid::new_v4().to_string(),
        })
    }

    /// The lock row's own key (`<item address>` / `OBJECTLOCK`).
    pub fn key(&self) -> &ItemKey {
        &self.key
    }

    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    pub fn lock_id(&self) -> &str {
        &self.lock_id
    }

    /// Expiry as a timestamp, if representable.
    pub fn expires_at_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expires_at, 0)
    }

    /// True once `now` (epoch seconds) has passed the expiry.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at < now
    }

    /// Returns a copy carrying a new expiry.
    pub fn with_expires_at(&self, expires_at: i64) -> Self {
        Self {
            expires_at,
            ..self.clone()
        }
    }

    /// Returns a copy presenting a different lock id.
    pub fn with_lock_id(&self, lock_id: impl Into<String>) -> Self {
        Self {
            lock_id: lock_id.into(),
            ..self.clone()
        }
    }
}

/// Key of the lock row guarding `item`.
pub fn lock_key_for(item: &ItemKey) -> std::result::Result<ItemKey, KeyError> {
    ItemKey::new(item.address(), LOCK_OBJECT_TYPE)
}

/// Expiry, in epoch seconds, of a lease taken at `now`.
pub fn lease_expiration(now: DateTime<Utc>, lease: Duration) -> i64 {
    let lease_secs = i64::try_from(lease.as_secs()).unwrap_or(i64::MAX);
    now.timestamp().saturating_add(lease_secs)
}

impl StoredItem for ItemLock {
    fn item_key(&self) -> &ItemKey {
        &self.key
    }

    fn to_attributes(&self) -> Result<AttributeMap> {
        let mut item = AttributeMap::new();
        item.insert(
            EXPIRES_AT_ATTRIBUTE.to_string(),
            AttributeValue::from(self.expires_at),
        );
        item.insert(
            LOCK_ID_ATTRIBUTE.to_string(),
            AttributeValue::S(self.lock_id.clone()),
        );
        Ok(item)
    }

    fn from_attributes(item: &AttributeMap) -> Result<Self> {
        Ok(Self {
            key: ItemKey::from_attributes(item)?,
            expires_at: get_i64(item, EXPIRES_AT_ATTRIBUTE)?,
            lock_id: get_string(item, LOCK_ID_ATTRIBUTE)?,
        })
    }
}
