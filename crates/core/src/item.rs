//! The marshaling contract for storable entities.

use serde_json::{Map, Value};

use crate::attribute::{attributes_to_object, object_to_attributes, AttributeMap};
use crate::error::Result;
use crate::key::{ItemKey, ID_ATTRIBUTE, OBJECT_TYPE_ATTRIBUTE};

/// An entity the repository can store.
///
/// `to_attributes` does not need to emit the key attributes; the adapter
/// adds `Id` and `ObjectType` from [`StoredItem::item_key`] and they take
/// precedence. `from_attributes` receives the full stored row, key
/// attributes included.
///
/// Types that already derive serde traits can lean on the serde bridge:
///
/// ```
/// use itemstore_core::attribute::{from_attribute_map, to_attribute_map, AttributeMap};
/// use itemstore_core::{ItemKey, Result, StoredItem};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct User {
///     #[serde(flatten)]
///     key: ItemKey,
///     name: String,
/// }
///
/// impl StoredItem for User {
///     fn item_key(&self) -> &ItemKey {
///         &self.key
///     }
///
///     fn to_attributes(&self) -> Result<AttributeMap> {
///         Ok(to_attribute_map(self)?)
///     }
///
///     fn from_attributes(item: &AttributeMap) -> Result<Self> {
///         Ok(from_attribute_map(item)?)
///     }
/// }
/// ```
pub trait StoredItem: Sized {
    /// The item's composite key.
    fn item_key(&self) -> &ItemKey;

    /// Converts the entity's fields into attributes.
    fn to_attributes(&self) -> Result<AttributeMap>;

    /// Rebuilds the entity from a stored row.
    fn from_attributes(item: &AttributeMap) -> Result<Self>;
}

/// Marshals an entity into a full row, key attributes included.
pub fn to_item<T: StoredItem>(entity: &T) -> Result<AttributeMap> {
    let mut item = entity.to_attributes()?;
    item.extend(entity.item_key().to_attributes());
    Ok(item)
}

/// A schemaless item: a key plus arbitrary JSON attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonItem {
    key: ItemKey,
    attributes: Map<String, Value>,
}

impl JsonItem {
    /// Creates an item. `Id` and `ObjectType` entries in `attributes` are
    /// dropped in favor of `key`.
    pub fn new(key: ItemKey, mut attributes: Map<String, Value>) -> Self {
        attributes.remove(ID_ATTRIBUTE);
        attributes.remove(OBJECT_TYPE_ATTRIBUTE);
        Self { key, attributes }
    }

    pub fn key(&self) -> &ItemKey {
        &self.key
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// The whole item as one JSON object, key attributes included.
    pub fn to_json(&self) -> Value {
        let mut object = self.attributes.clone();
        object.insert(
            ID_ATTRIBUTE.to_string(),
            Value::String(self.key.id().to_string()),
        );
        object.insert(
            OBJECT_TYPE_ATTRIBUTE.to_string(),
            Value::String(self.key.object_type().to_string()),
        );
        Value::Object(object)
    }
}

impl StoredItem for JsonItem {
    fn item_key(&self) -> &ItemKey {
        &self.key
    }

    fn to_attributes(&self) -> Result<AttributeMap> {
        Ok(object_to_attributes(self.attributes.clone()))
    }

    fn from_attributes(item: &AttributeMap) -> Result<Self> {
        let key = ItemKey::from_attributes(item)?;
        let attributes = match attributes_to_object(item) {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Ok(Self::new(key, attributes))
    }
}
