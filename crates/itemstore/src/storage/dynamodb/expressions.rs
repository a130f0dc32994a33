//! DynamoDB expression rendering.
//!
//! Pure functions turning [`Condition`]s and partition queries into
//! expression strings plus their placeholder maps. Attribute names always
//! go through `#name` placeholders so reserved words never matter.

use std::collections::HashMap;

use itemstore_core::key::{ID_ATTRIBUTE, OBJECT_TYPE_ATTRIBUTE};
use itemstore_core::lock::{EXPIRES_AT_ATTRIBUTE, LOCK_ID_ATTRIBUTE};
use itemstore_core::{AttributeMap, AttributeValue, Condition};

/// A rendered expression with its placeholder maps.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub expression: String,
    pub names: HashMap<String, String>,
    pub values: AttributeMap,
}

impl Expression {
    fn new(expression: &str) -> Self {
        Self {
            expression: expression.to_string(),
            names: HashMap::new(),
            values: AttributeMap::new(),
        }
    }

    fn name(mut self, placeholder: &str, attribute: &str) -> Self {
        self.names
            .insert(placeholder.to_string(), attribute.to_string());
        self
    }

    fn value(mut self, placeholder: &str, value: AttributeValue) -> Self {
        self.values.insert(placeholder.to_string(), value);
        self
    }
}

/// Render a write condition.
///
/// Pattern (lock available): `attribute_not_exists(#id) OR #expires_at < :now`
///
/// Pattern (lock held): `attribute_exists(#id) AND #lock_id = :lock_id`
pub fn condition_expression(condition: &Condition) -> Expression {
    match condition {
        Condition::LockAvailable { now } => {
            Expression::new("attribute_not_exists(#id) OR #expires_at < :now")
                .name("#id", ID_ATTRIBUTE)
                .name("#expires_at", EXPIRES_AT_ATTRIBUTE)
                .value(":now", AttributeValue::from(*now))
        }
        Condition::LockHeldBy { lock_id } => {
            Expression::new("attribute_exists(#id) AND #lock_id = :lock_id")
                .name("#id", ID_ATTRIBUTE)
                .name("#lock_id", LOCK_ID_ATTRIBUTE)
                .value(":lock_id", AttributeValue::S(lock_id.clone()))
        }
    }
}

/// Render the key condition selecting a whole partition.
///
/// Pattern: `#object_type = :object_type`
pub fn partition_key_condition(object_type: &str) -> Expression {
    Expression::new("#object_type = :object_type")
        .name("#object_type", OBJECT_TYPE_ATTRIBUTE)
        .value(":object_type", AttributeValue::from(object_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_available_expression() {
        let expr = condition_expression(&Condition::LockAvailable { now: 1_700_000_000 });

        assert_eq!(
            expr.expression,
            "attribute_not_exists(#id) OR #expires_at < :now"
        );
        assert_eq!(expr.names.get("#id").unwrap(), "Id");
        assert_eq!(expr.names.get("#expires_at").unwrap(), "ExpiresAt");
        assert_eq!(
            expr.values.get(":now"),
            Some(&AttributeValue::N("1700000000".to_string()))
        );
    }

    #[test]
    fn test_lock_held_by_expression() {
        let expr = condition_expression(&Condition::LockHeldBy {
            lock_id: "abc".to_string(),
        });

        assert_eq!(
            expr.expression,
            "attribute_exists(#id) AND #lock_id = :lock_id"
        );
        assert_eq!(expr.names.get("#lock_id").unwrap(), "LockId");
        assert_eq!(expr.values.get(":lock_id"), Some(&AttributeValue::from("abc")));
    }

    #[test]
    fn test_every_placeholder_is_bound() {
        let expressions = [
            condition_expression(&Condition::LockAvailable { now: 1 }),
            condition_expression(&Condition::LockHeldBy {
                lock_id: "x".to_string(),
            }),
            partition_key_condition("User"),
        ];

        for expr in expressions {
            for token in expr.expression.split(|c: char| !(c.is_alphanumeric() || "#:_".contains(c))) {
                if token.starts_with('#') {
                    assert!(expr.names.contains_key(token), "unbound {token}");
                } else if token.starts_with(':') {
                    assert!(expr.values.contains_key(token), "unbound {token}");
                }
            }
        }
    }

    #[test]
    fn test_partition_key_condition() {
        let expr = partition_key_condition("User");
        assert_eq!(expr.expression, "#object_type = :object_type");
        assert_eq!(expr.names.get("#object_type").unwrap(), "ObjectType");
        assert_eq!(expr.values.get(":object_type"), Some(&AttributeValue::from("User")));
    }
}
