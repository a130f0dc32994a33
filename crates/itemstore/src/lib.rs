//! Typed item storage with lease-based locks.
//!
//! Entities implementing [`StoredItem`] are stored in a single table keyed
//! by `(ObjectType, Id)`. [`Repository`] adds, fetches, deletes and lists
//! them, and hands out expiring exclusive locks on any item.
//!
//! ```rust
//! # #[tokio::main]
//! # async fn main() -> itemstore::Result<()> {
//! use itemstore::storage::inmemory::InMemoryStore;
//! use itemstore::{ItemKey, JsonItem, Repository};
//!
//! let repo = Repository::new(InMemoryStore::new());
//! let key = ItemKey::new("u1", "User")?;
//! let mut attributes = serde_json::Map::new();
//! attributes.insert("name".into(), "Ann".into());
//!
//! repo.add(&JsonItem::new(key.clone(), attributes)).await?;
//! let lock = repo.lock(&key).await?;
//! let ann: JsonItem = repo.get(&key).await?;
//! assert_eq!(ann.get("name"), Some(&"Ann".into()));
//! repo.release(&lock).await?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod config;
pub mod lock;
pub mod repository;
pub mod storage;

pub use config::RepositoryConfig;
pub use itemstore_core::{
    ItemKey, ItemLock, JsonItem, RepositoryError, Result, StoreError, StoredItem,
};
pub use repository::Repository;
