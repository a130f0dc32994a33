//! DynamoDB storage backend.
//!
//! One table, partition key `ObjectType`, sort key `Id`, no secondary
//! indexes. Write conditions are rendered into condition expressions so the
//! service evaluates them atomically with the write.

mod conversions;
mod error;
mod expressions;
mod store;

pub use store::{create_client, DynamoDbStore};
