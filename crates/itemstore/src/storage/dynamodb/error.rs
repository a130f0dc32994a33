//! DynamoDB error mapping.
//!
//! Maps AWS SDK errors to `StoreError` from `itemstore_core`.

use std::fmt::Debug;

use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::query::QueryError;
use itemstore_core::StoreError;

/// Transport-level failures never reach the service, so they have no
/// service error to inspect.
fn transport_error<E, R>(err: &SdkError<E, R>) -> Option<StoreError> {
    match err {
        SdkError::DispatchFailure(e) => Some(StoreError::ConnectionFailed(format!("{:?}", e))),
        SdkError::TimeoutError(_) => {
            Some(StoreError::ConnectionFailed("Request timed out".to_string()))
        }
        _ => None,
    }
}

fn internal_error(operation: &'static str) -> StoreError {
    StoreError::Service {
        operation,
        message: "DynamoDB internal server error".to_string(),
    }
}

/// Map a GetItem SDK error to StoreError.
pub fn map_get_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<GetItemError, R>,
    table_name: &str,
) -> StoreError {
    if let Some(e) = transport_error(&err) {
        return e;
    }
    match err.into_service_error() {
        GetItemError::ResourceNotFoundException(_) => {
            StoreError::TableNotFound(table_name.to_string())
        }
        GetItemError::ProvisionedThroughputExceededException(_) => StoreError::Throttled,
        GetItemError::RequestLimitExceeded(_) => StoreError::Throttled,
        GetItemError::InternalServerError(_) => internal_error("GetItem"),
        err => StoreError::Service {
            operation: "GetItem",
            message: format!("{:?}", err),
        },
    }
}

/// Map a Query SDK error to StoreError.
pub fn map_query_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<QueryError, R>,
    table_name: &str,
) -> StoreError {
    if let Some(e) = transport_error(&err) {
        return e;
    }
    match err.into_service_error() {
        QueryError::ResourceNotFoundException(_) => {
            StoreError::TableNotFound(table_name.to_string())
        }
        QueryError::ProvisionedThroughputExceededException(_) => StoreError::Throttled,
        QueryError::RequestLimitExceeded(_) => StoreError::Throttled,
        QueryError::InternalServerError(_) => internal_error("Query"),
        err => StoreError::Service {
            operation: "Query",
            message: format!("{:?}", err),
        },
    }
}

/// Map a PutItem SDK error to StoreError.
pub fn map_put_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<PutItemError, R>,
    table_name: &str,
) -> StoreError {
    if let Some(e) = transport_error(&err) {
        return e;
    }
    match err.into_service_error() {
        PutItemError::ConditionalCheckFailedException(_) => StoreError::ConditionalCheckFailed,
        PutItemError::ResourceNotFoundException(_) => {
            StoreError::TableNotFound(table_name.to_string())
        }
        PutItemError::ProvisionedThroughputExceededException(_) => StoreError::Throttled,
        PutItemError::RequestLimitExceeded(_) => StoreError::Throttled,
        PutItemError::ItemCollectionSizeLimitExceededException(_) => StoreError::Service {
            operation: "PutItem",
            message: "Item collection size limit exceeded".to_string(),
        },
        PutItemError::TransactionConflictException(_) => StoreError::Service {
            operation: "PutItem",
            message: "Transaction conflict, please retry".to_string(),
        },
        PutItemError::InternalServerError(_) => internal_error("PutItem"),
        err => StoreError::Service {
            operation: "PutItem",
            message: format!("{:?}", err),
        },
    }
}

/// Map a DeleteItem SDK error to StoreError.
pub fn map_delete_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<DeleteItemError, R>,
    table_name: &str,
) -> StoreError {
    if let Some(e) = transport_error(&err) {
        return e;
    }
    match err.into_service_error() {
        DeleteItemError::ConditionalCheckFailedException(_) => StoreError::ConditionalCheckFailed,
        DeleteItemError::ResourceNotFoundException(_) => {
            StoreError::TableNotFound(table_name.to_string())
        }
        DeleteItemError::ProvisionedThroughputExceededException(_) => StoreError::Throttled,
        DeleteItemError::RequestLimitExceeded(_) => StoreError::Throttled,
        DeleteItemError::ItemCollectionSizeLimitExceededException(_) => StoreError::Service {
            operation: "DeleteItem",
            message: "Item collection size limit exceeded".to_string(),
        },
        DeleteItemError::TransactionConflictException(_) => StoreError::Service {
            operation: "DeleteItem",
            message: "Transaction conflict, please retry".to_string(),
        },
        DeleteItemError::InternalServerError(_) => internal_error("DeleteItem"),
        err => StoreError::Service {
            operation: "DeleteItem",
            message: format!("{:?}", err),
        },
    }
}
