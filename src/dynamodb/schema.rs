use aws_sdk_dynamodb::types::{KeyType, ScalarAttributeType, TableDescription};

/// Scalar type of a key attribute.
///
/// DynamoDB only accepts scalar types for key attributes: string, number
/// and binary. Non-key attributes are schemaless and never declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Represents a string field.
    String,
    /// Represents a number field.
    Number,
    /// Represents a binary field.
    Binary,
}

impl FieldType {
    pub fn to_scalar(self) -> ScalarAttributeType {
        match self {
            FieldType::String => ScalarAttributeType::S,
            FieldType::Number => ScalarAttributeType::N,
            FieldType::Binary => ScalarAttributeType::B,
        }
    }

    /// Maps an SDK scalar type back, `None` for values this crate does not model.
    pub fn from_scalar(scalar: &ScalarAttributeType) -> Option<Self> {
        match scalar {
            ScalarAttributeType::S => Some(FieldType::String),
            ScalarAttributeType::N => Some(FieldType::Number),
            ScalarAttributeType::B => Some(FieldType::Binary),
            _ => None,
        }
    }

    /// The one-letter type code used in the wire format and in templates.
    pub fn code(self) -> &'static str {
        match self {
            FieldType::String => "S",
            FieldType::Number => "N",
            FieldType::Binary => "B",
        }
    }
}

/// Role of an attribute in the primary key.
///
/// - **Hash**: the partition key, decides which partition stores the item.
/// - **Range**: the sort key, orders items sharing a partition key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole {
    Hash,
    Range,
}

impl KeyRole {
    pub fn to_key_type(self) -> KeyType {
        match self {
            KeyRole::Hash => KeyType::Hash,
            KeyRole::Range => KeyType::Range,
        }
    }

    pub fn from_key_type(key_type: &KeyType) -> Option<Self> {
        match key_type {
            KeyType::Hash => Some(KeyRole::Hash),
            KeyType::Range => Some(KeyRole::Range),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            KeyRole::Hash => "HASH",
            KeyRole::Range => "RANGE",
        }
    }
}

/// A primary key attribute as reported by `DescribeTable`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAttribute {
    pub name: String,
    pub role: KeyRole,
    pub field_type: Option<FieldType>,
}

/// Extracts the key attributes of a table, in key schema order.
///
/// The type of each key comes from the matching attribute definition; it is
/// `None` if the description carries no definition for that key.
pub fn key_attributes(table: &TableDescription) -> Vec<KeyAttribute> {
    table
        .key_schema()
        .iter()
        .filter_map(|element| {
            let role = KeyRole::from_key_type(element.key_type())?;
            let field_type = table
                .attribute_definitions()
                .iter()
                .find(|definition| definition.attribute_name() == element.attribute_name())
                .and_then(|definition| FieldType::from_scalar(definition.attribute_type()));

            Some(KeyAttribute {
                name: element.attribute_name().to_string(),
                role,
                field_type,
            })
        })
        .collect()
}
