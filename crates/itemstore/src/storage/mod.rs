//! Storage backend implementations.
//!
//! Concrete implementations of `itemstore_core::ItemStore`, selected at
//! compile time via feature flags.
//!
//! # Feature Flags
//!
//! - `dynamodb` (default): AWS DynamoDB backend using `aws-sdk-dynamodb`
//! - `inmemory` (default): process-local backend for tests and prototyping
//!
//! Both can be enabled at once; the repository is generic over the store.
//!
//! Build without DynamoDB:
//! ```bash
//! cargo build -p itemstore --no-default-features --features inmemory
//! ```

#[cfg(feature = "dynamodb")]
pub mod dynamodb;

#[cfg(any(test, feature = "inmemory"))]
pub mod inmemory;

#[cfg(feature = "dynamodb")]
pub use dynamodb::DynamoDbStore;

#[cfg(any(test, feature = "inmemory"))]
pub use inmemory::InMemoryStore;
