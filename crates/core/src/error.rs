use thiserror::Error;

use crate::attribute::AttributeError;
use crate::key::KeyError;
use crate::store::StoreError;

/// Errors that can occur during repository operations.
///
/// `NotFound`, `AlreadyLocked` and `LockNotHeld` are expected outcomes the
/// caller is meant to handle. `ReservedObjectType`, `InvalidTarget`,
/// `InvalidKey` and `Serialization` point at caller or schema bugs.
/// `StoreRead` and `StoreWrite` wrap backend failures unchanged; nothing
/// here retries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Item not found: {key}")]
    NotFound { key: String },

    #[error("Item is already locked: {key}")]
    AlreadyLocked { key: String },

    #[error("Lock is not held: {key}")]
    LockNotHeld { key: String },

    #[error("Object type {object_type} is reserved for locks")]
    ReservedObjectType { object_type: String },

    #[error("Invalid target for {key}: {reason}")]
    InvalidTarget { key: String, reason: String },

    #[error("Invalid key: {0}")]
    InvalidKey(#[from] KeyError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("{operation} failed for {key}: {source}")]
    StoreRead {
        operation: &'static str,
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("{operation} failed for {key}: {source}")]
    StoreWrite {
        operation: &'static str,
        key: String,
        #[source]
        source: StoreError,
    },
}

impl RepositoryError {
    /// True for a read of an absent key.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }

    /// True for lease contention (`AlreadyLocked` or `LockNotHeld`).
    pub fn is_contention(&self) -> bool {
        matches!(
            self,
            RepositoryError::AlreadyLocked { .. } | RepositoryError::LockNotHeld { .. }
        )
    }

    /// The backend error behind a `StoreRead` / `StoreWrite`, if any.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            RepositoryError::StoreRead { source, .. }
            | RepositoryError::StoreWrite { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<AttributeError> for RepositoryError {
    fn from(err: AttributeError) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_not_found_display() {
        let error = RepositoryError::NotFound {
            key: "u1:User".to_string(),
        };
        assert_eq!(error.to_string(), "Item not found: u1:User");
        assert!(error.is_not_found());
        assert!(!error.is_contention());
    }

    #[test]
    fn test_repository_error_contention() {
        let locked = RepositoryError::AlreadyLocked {
            key: "u1:User:OBJECTLOCK".to_string(),
        };
        let not_held = RepositoryError::LockNotHeld {
            key: "u1:User:OBJECTLOCK".to_string(),
        };
        assert!(locked.is_contention());
        assert!(not_held.is_contention());
        assert_eq!(
            locked.to_string(),
            "Item is already locked: u1:User:OBJECTLOCK"
        );
    }

    #[test]
    fn test_repository_error_reserved_display() {
        let error = RepositoryError::ReservedObjectType {
            object_type: "OBJECTLOCK".to_string(),
        };
        assert_eq!(error.to_string(), "Object type OBJECTLOCK is reserved for locks");
    }

    #[test]
    fn test_repository_error_store_write_keeps_source() {
        let error = RepositoryError::StoreWrite {
            operation: "PutItem",
            key: "u1:User".to_string(),
            source: StoreError::Throttled,
        };
        assert_eq!(
            error.to_string(),
            "PutItem failed for u1:User: Throughput exceeded, please retry"
        );
        assert_eq!(error.store_error(), Some(&StoreError::Throttled));
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_attribute_error_becomes_serialization() {
        let error: RepositoryError = AttributeError::Missing("name".to_string()).into();
        assert_eq!(
            error,
            RepositoryError::Serialization("Missing attribute: name".to_string())
        );
    }

    #[test]
    fn test_key_error_becomes_invalid_key() {
        let error: RepositoryError = KeyError::EmptyId.into();
        assert_eq!(error.to_string(), "Invalid key: Item id must not be empty");
    }
}
