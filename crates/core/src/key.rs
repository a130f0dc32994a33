//! Composite item keys.
//!
//! Every stored row is addressed by a partition key (`ObjectType`) and a
//! sort key (`Id`). Lock rows use the same scheme under a reserved object
//! type, see [`crate::lock`].

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::attribute::{get_string, AttributeMap, AttributeValue};
use crate::error::{RepositoryError, Result};

/// Name of the partition key attribute.
pub const OBJECT_TYPE_ATTRIBUTE: &str = "ObjectType";

/// Name of the sort key attribute.
pub const ID_ATTRIBUTE: &str = "Id";

/// Errors raised when building an [`ItemKey`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Item id must not be empty")]
    EmptyId,
    #[error("Item object type must not be empty")]
    EmptyObjectType,
}

/// Composite identity of a stored item.
///
/// Both parts are guaranteed non-empty. Two items with the same key refer
/// to the same stored row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawItemKey", into = "RawItemKey")]
pub struct ItemKey {
    id: String,
    object_type: String,
}

impl ItemKey {
    /// Creates a key, rejecting empty or whitespace-only parts.
    pub fn new(
        id: impl Into<String>,
        object_type: impl Into<String>,
    ) -> std::result::Result<Self, KeyError> {
        let id = id.into();
        let object_type = object_type.into();

        if id.trim().is_empty() {
            return Err(KeyError::EmptyId);
        }
        if object_type.trim().is_empty() {
            return Err(KeyError::EmptyObjectType);
        }

        Ok(Self { id, object_type })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    /// Returns the canonical `<id>:<object_type>` form.
    ///
    /// Used for logs, error context and lock row ids, never as a storage
    /// address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.id, self.object_type)
    }

    /// Returns the key attribute pair as stored in the table.
    pub fn to_attributes(&self) -> AttributeMap {
        let mut item = AttributeMap::new();
        item.insert(
            ID_ATTRIBUTE.to_string(),
            AttributeValue::S(self.id.clone()),
        );
        item.insert(
            OBJECT_TYPE_ATTRIBUTE.to_string(),
            AttributeValue::S(self.object_type.clone()),
        );
        item
    }

    /// Reads the key attribute pair back out of a stored row.
    pub fn from_attributes(item: &AttributeMap) -> Result<Self> {
        let id = get_string(item, ID_ATTRIBUTE)?;
        let object_type = get_string(item, OBJECT_TYPE_ATTRIBUTE)?;
        Self::new(id, object_type).map_err(RepositoryError::from)
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.object_type)
    }
}

/// Serde shape of [`ItemKey`], validated on the way in.
#[derive(Serialize, Deserialize)]
struct RawItemKey {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "ObjectType")]
    object_type: String,
}

impl TryFrom<RawItemKey> for ItemKey {
    type Error = KeyError;

    fn try_from(raw: RawItemKey) -> std::result::Result<Self, Self::Error> {
        ItemKey::new(raw.id, raw.object_type)
    }
}

impl From<ItemKey> for RawItemKey {
    fn from(key: ItemKey) -> Self {
        Self {
            id: key.id,
            object_type: key.object_type,
        }
    }
}
