//! Table configuration types (Functional Core - pure data).

/// Table schema configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    pub table_name: String,
    pub partition_key: KeyAttribute,
    pub sort_key: KeyAttribute,
    pub billing_mode: BillingMode,
}

/// A key attribute definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAttribute {
    pub name: String,
    pub attribute_type: AttributeType,
}

/// DynamoDB attribute types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    String,
}

/// Billing mode for the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingMode {
    PayPerRequest,
}

impl TableConfig {
    /// Sets the table name.
    pub fn with_table_name(mut self, name: &str) -> Self {
        self.table_name = name.to_string();
        self
    }
}

/// Returns the item table layout: every object type is a partition, ids
/// sort within it. Lock rows share the table under `OBJECTLOCK`.
pub fn item_table_config() -> TableConfig {
    TableConfig {
        table_name: "itemstore".to_string(),
        partition_key: KeyAttribute {
            name: "ObjectType".to_string(),
            attribute_type: AttributeType::String,
        },
        sort_key: KeyAttribute {
            name: "Id".to_string(),
            attribute_type: AttributeType::String,
        },
        billing_mode: BillingMode::PayPerRequest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_table_keys() {
        let config = item_table_config();
        assert_eq!(config.partition_key.name, "ObjectType");
        assert_eq!(config.sort_key.name, "Id");
        assert_eq!(config.billing_mode, BillingMode::PayPerRequest);
    }

    #[test]
    fn test_with_table_name() {
        let config = item_table_config().with_table_name("items-test");
        assert_eq!(config.table_name, "items-test");
    }
}
