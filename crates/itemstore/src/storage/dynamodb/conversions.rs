//! DynamoDB attribute conversion functions.
//!
//! Pure functions for converting between SDK `AttributeValue` maps and the
//! backend-neutral attribute model. These are testable in isolation without
//! DynamoDB access.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue as DynamoValue;
use itemstore_core::{AttributeMap, AttributeValue, StoreError};

/// Convert an attribute map to a DynamoDB item.
pub fn to_dynamo_item(item: AttributeMap) -> HashMap<String, DynamoValue> {
    item.into_iter()
        .map(|(k, v)| (k, to_dynamo_value(v)))
        .collect()
}

/// Convert a single attribute value to its SDK form.
pub fn to_dynamo_value(value: AttributeValue) -> DynamoValue {
    match value {
        AttributeValue::S(s) => DynamoValue::S(s),
        AttributeValue::N(n) => DynamoValue::N(n),
        AttributeValue::Bool(b) => DynamoValue::Bool(b),
        AttributeValue::Null => DynamoValue::Null(true),
        AttributeValue::M(m) => DynamoValue::M(to_dynamo_item(m)),
        AttributeValue::L(l) => DynamoValue::L(l.into_iter().map(to_dynamo_value).collect()),
    }
}

/// Convert a DynamoDB item to an attribute map.
///
/// String and number sets come back as lists. Binary values have no
/// counterpart and are rejected.
pub fn from_dynamo_item(
    item: HashMap<String, DynamoValue>,
) -> Result<AttributeMap, StoreError> {
    item.into_iter()
        .map(|(k, v)| {
            let value = from_dynamo_value(&k, v)?;
            Ok((k, value))
        })
        .collect()
}

fn from_dynamo_value(name: &str, value: DynamoValue) -> Result<AttributeValue, StoreError> {
    match value {
        DynamoValue::S(s) => Ok(AttributeValue::S(s)),
        DynamoValue::N(n) => Ok(AttributeValue::N(n)),
        DynamoValue::Bool(b) => Ok(AttributeValue::Bool(b)),
        DynamoValue::Null(_) => Ok(AttributeValue::Null),
        DynamoValue::M(m) => Ok(AttributeValue::M(from_dynamo_item(m)?)),
        DynamoValue::L(l) => l
            .into_iter()
            .map(|v| from_dynamo_value(name, v))
            .collect::<Result<Vec<_>, _>>()
            .map(AttributeValue::L),
        DynamoValue::Ss(ss) => Ok(AttributeValue::L(
            ss.into_iter().map(AttributeValue::S).collect(),
        )),
        DynamoValue::Ns(ns) => Ok(AttributeValue::L(
            ns.into_iter().map(AttributeValue::N).collect(),
        )),
        other => Err(StoreError::UnsupportedAttribute(format!(
            "{name}: {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::primitives::Blob;

    fn sample_item() -> AttributeMap {
        let mut address = AttributeMap::new();
        address.insert("city".to_string(), AttributeValue::from("Montevideo"));

        let mut item = AttributeMap::new();
        item.insert("Id".to_string(), AttributeValue::from("u1"));
        item.insert("ObjectType".to_string(), AttributeValue::from("User"));
        item.insert("age".to_string(), AttributeValue::from(42_i64));
        item.insert("active".to_string(), AttributeValue::from(true));
        item.insert("nickname".to_string(), AttributeValue::Null);
        item.insert("address".to_string(), AttributeValue::M(address));
        item.insert(
            "tags".to_string(),
            AttributeValue::L(vec![AttributeValue::from("a"), AttributeValue::from(1_i64)]),
        );
        item
    }

    #[test]
    fn test_item_round_trip() {
        let item = sample_item();
        let dynamo = to_dynamo_item(item.clone());

        assert_eq!(dynamo.get("Id").unwrap().as_s().unwrap(), "u1");
        assert_eq!(dynamo.get("age").unwrap().as_n().unwrap(), "42");
        assert!(dynamo.get("nickname").unwrap().is_null());

        assert_eq!(from_dynamo_item(dynamo).unwrap(), item);
    }

    #[test]
    fn test_sets_become_lists() {
        let mut dynamo = HashMap::new();
        dynamo.insert(
            "names".to_string(),
            DynamoValue::Ss(vec!["a".to_string(), "b".to_string()]),
        );
        dynamo.insert("scores".to_string(), DynamoValue::Ns(vec!["1".to_string()]));

        let item = from_dynamo_item(dynamo).unwrap();
        assert_eq!(
            item.get("names"),
            Some(&AttributeValue::L(vec![
                AttributeValue::from("a"),
                AttributeValue::from("b"),
            ]))
        );
        assert_eq!(
            item.get("scores"),
            Some(&AttributeValue::L(vec![AttributeValue::N("1".to_string())]))
        );
    }

    #[test]
    fn test_binary_is_rejected() {
        let mut dynamo = HashMap::new();
        dynamo.insert("blob".to_string(), DynamoValue::B(Blob::new(vec![1, 2, 3])));

        let err = from_dynamo_item(dynamo).unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedAttribute(msg) if msg.starts_with("blob")));
    }
}
