//! In-memory storage backend for testing.
//!
//! Rows live in a `BTreeMap` wrapped in `Arc<RwLock<_>>`. Conditional writes
//! are checked and applied under one write guard, so they are atomic with
//! respect to every other caller sharing the store. Data is lost when the
//! last clone is dropped.
//!
//! # Example
//!
//! ```rust
//! use itemstore::storage::inmemory::InMemoryStore;
//! use itemstore::Repository;
//!
//! let repo = Repository::new(InMemoryStore::new());
//! // Use repo for testing...
//! ```

mod store;

pub use store::InMemoryStore;
