//! AWS SDK client setup (Imperative Shell).

use aws_sdk_dynamodb::config::Credentials;
use aws_sdk_dynamodb::types::{KeyType, TableStatus as SdkTableStatus};
use aws_sdk_dynamodb::Client;

use super::error::{DynamodbError, Result};
use super::planning::{TableState, TableStatus};

/// AWS client configuration.
#[derive(Debug, Clone)]
pub struct AwsConfig {
    /// Custom endpoint URL (for local DynamoDB).
    pub endpoint_url: Option<String>,
    /// AWS region.
    pub region: String,
    /// Use fixed dummy credentials, as DynamoDB Local accepts any.
    pub dummy_credentials: bool,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            endpoint_url: std::env::var("AWS_ENDPOINT_URL").ok(),
            region: std::env::var("AWS_REGION").unwrap_or_else(|_| "eu-central-1".to_string()),
            dummy_credentials: false,
        }
    }
}

impl AwsConfig {
    /// Configuration pointing at a DynamoDB Local endpoint.
    pub fn local(endpoint_url: &str, region: &str) -> Self {
        Self {
            endpoint_url: Some(endpoint_url.to_string()),
            region: region.to_string(),
            dummy_credentials: true,
        }
    }

    /// Returns a display string for the target environment.
    pub fn target_display(&self) -> String {
        match &self.endpoint_url {
            Some(url) => format!("Local DynamoDB ({})", url),
            None => format!("AWS DynamoDB (region: {})", self.region),
        }
    }
}

/// Creates a DynamoDB client with the given configuration.
pub async fn create_client(config: &AwsConfig) -> Result<Client> {
    let mut sdk_config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.region.clone()));

    if let Some(endpoint) = &config.endpoint_url {
        sdk_config_loader = sdk_config_loader.endpoint_url(endpoint);
    }

    if config.dummy_credentials {
        sdk_config_loader = sdk_config_loader
            .credentials_provider(Credentials::new("test", "test", None, None, "xtask"));
    }

    let sdk_config = sdk_config_loader.load().await;
    Ok(Client::new(&sdk_config))
}

/// Fetches current table state, returns None if table doesn't exist.
pub async fn get_table_state(client: &Client, table_name: &str) -> Result<Option<TableState>> {
    let response = match client.describe_table().table_name(table_name).send().await {
        Ok(response) => response,
        Err(err)
            if err
                .as_service_error()
                .is_some_and(|e| e.is_resource_not_found_exception()) =>
        {
            return Ok(None);
        }
        Err(err) => return Err(DynamodbError::AwsSdk(err.to_string())),
    };

    let table = response.table().ok_or_else(|| {
        DynamodbError::AwsSdk(format!("DescribeTable returned no table for '{table_name}'"))
    })?;

    let key_named = |key_type: KeyType| {
        table
            .key_schema()
            .iter()
            .find(|k| *k.key_type() == key_type)
            .map(|k| k.attribute_name().to_string())
    };

    let status = match table.table_status() {
        Some(SdkTableStatus::Creating) => TableStatus::Creating,
        Some(SdkTableStatus::Updating) => TableStatus::Updating,
        Some(SdkTableStatus::Deleting) => TableStatus::Deleting,
        _ => TableStatus::Active,
    };

    Ok(Some(TableState {
        status,
        partition_key: key_named(KeyType::Hash),
        sort_key: key_named(KeyType::Range),
    }))
}
