//! Core types for itemstore.
//!
//! Pure data, traits and errors shared by the repository and its storage
//! backends. Nothing in this crate performs I/O.

pub mod attribute;
pub mod error;
pub mod item;
pub mod key;
pub mod lock;
pub mod store;

pub use attribute::{AttributeError, AttributeMap, AttributeValue};
pub use error::{RepositoryError, Result};
pub use item::{to_item, JsonItem, StoredItem};
pub use key::{ItemKey, KeyError};
pub use lock::{ItemLock, DEFAULT_LEASE_DURATION, LOCK_OBJECT_TYPE};
pub use store::{Condition, ItemStore, StoreError};
