use std::{env, time::Duration};

use itemstore_core::DEFAULT_LEASE_DURATION;

/// Fallback region when nothing is configured.
pub const DEFAULT_REGION: &str = "eu-central-1";

/// Placeholder table name; operations against it fail until a real name is set.
pub const DEFAULT_TABLE_NAME: &str = "<DynamoDbTableNotSet>";

/// Repository configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// DynamoDB table name (default: "<DynamoDbTableNotSet>")
    pub table_name: String,
    /// AWS region (default: "eu-central-1")
    pub region: String,
    /// Custom endpoint URL, e.g. DynamoDB Local (default: none)
    pub endpoint_url: Option<String>,
    /// Lock lease duration in seconds (default: 300)
    pub lease_duration_seconds: u64,
}

impl RepositoryConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `DYNAMODB_TABLE_NAME` - Table name (default: "<DynamoDbTableNotSet>")
    /// - `AWS_REGION` - AWS region (default: "eu-central-1")
    /// - `AWS_ENDPOINT_URL` - Custom endpoint (default: unset)
    /// - `LOCK_LEASE_SECONDS` - Lock lease duration (default: 300)
    pub fn from_env() -> Self {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            table_name: var("DYNAMODB_TABLE_NAME")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
            region: var("AWS_REGION")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            endpoint_url: var("AWS_ENDPOINT_URL").filter(|v| !v.is_empty()),
            lease_duration_seconds: var("LOCK_LEASE_SECONDS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_LEASE_DURATION.as_secs()),
        }
    }

    /// Sets the table name.
    pub fn with_table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = name.into();
        self
    }

    /// Sets the AWS region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Points the client at a custom endpoint.
    pub fn with_endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }

    /// Sets the lock lease duration (whole seconds).
    pub fn with_lease_duration(mut self, lease: Duration) -> Self {
        self.lease_duration_seconds = lease.as_secs();
        self
    }

    /// Get lease duration as a Duration.
    pub fn lease_duration(&self) -> Duration {
        Duration::from_secs(self.lease_duration_seconds)
    }
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
