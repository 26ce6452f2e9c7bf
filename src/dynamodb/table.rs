use aws_sdk_dynamodb::types::{
    AttributeDefinition, KeySchemaElement, StreamSpecification, StreamViewType,
};

use crate::dynamodb::{FieldType, KeyRole};
use crate::error::{Error, Result};

/// What a table stream records for each modified item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamView {
    KeysOnly,
    NewImage,
    OldImage,
    NewAndOldImages,
}

impl StreamView {
    pub fn to_view_type(self) -> StreamViewType {
        match self {
            StreamView::KeysOnly => StreamViewType::KeysOnly,
            StreamView::NewImage => StreamViewType::NewImage,
            StreamView::OldImage => StreamViewType::OldImage,
            StreamView::NewAndOldImages => StreamViewType::NewAndOldImages,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            StreamView::KeysOnly => "KEYS_ONLY",
            StreamView::NewImage => "NEW_IMAGE",
            StreamView::OldImage => "OLD_IMAGE",
            StreamView::NewAndOldImages => "NEW_AND_OLD_IMAGES",
        }
    }
}

/// DynamoDB table configuration.
///
/// This struct represents a specific DynamoDB table, its key attributes and
/// the table-level features switched on after creation. Tables are always
/// created in on-demand (pay-per-request) capacity mode.
///
/// # Table Structure
///
/// - **Table Name**: A unique identifier for the table within the endpoint and region.
/// - **Primary Key**: Consists of a partition key and an optional sort key.
///   - **Partition Key**: Determines the partition where the item is stored.
///   - **Sort Key**: Optional. Used to sort items with the same partition key.
///
/// # Table Features
///
/// - **Streams**: Ordered log of item changes, see [`StreamView`].
/// - **Point-in-time recovery**: Continuous backups restorable to any second.
/// - **Time to live**: An attribute holding an epoch timestamp after which items expire.
///
/// # Example
///
/// ```
/// use aws_local_dev::dynamodb::{FieldType, StreamView, TableDefinition};
///
/// let table = TableDefinition::new("users", "user_id", Some("email"))
///     .with_stream(StreamView::NewAndOldImages)
///     .with_ttl_attribute("ttl")
///     .with_point_in_time_recovery();
///
/// assert_eq!(table.sort_key(), Some("email"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition<'a> {
    name: &'a str,
    partition_key: &'a str,
    sort_key: Option<&'a str>,
    key_type: FieldType,
    stream: Option<StreamView>,
    ttl_attribute: Option<&'a str>,
    point_in_time_recovery: bool,
}

impl<'a> TableDefinition<'a> {
    /// Creates a new `TableDefinition` with string-typed keys.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the DynamoDB table.
    /// * `partition_key` - The name of the partition key attribute.
    /// * `sort_key` - The name of the sort key attribute, if any.
    pub fn new(name: &'a str, partition_key: &'a str, sort_key: Option<&'a str>) -> Self {
        Self {
            name,
            partition_key,
            sort_key,
            key_type: FieldType::String,
            stream: None,
            ttl_attribute: None,
            point_in_time_recovery: false,
        }
    }

    /// Sets the scalar type shared by the partition and sort keys.
    pub fn with_key_type(mut self, key_type: FieldType) -> Self {
        self.key_type = key_type;
        self
    }

    pub fn with_stream(mut self, view: StreamView) -> Self {
        self.stream = Some(view);
        self
    }

    pub fn with_ttl_attribute(mut self, attribute: &'a str) -> Self {
        self.ttl_attribute = Some(attribute);
        self
    }

    pub fn with_point_in_time_recovery(mut self) -> Self {
        self.point_in_time_recovery = true;
        self
    }

    /// Returns the name of the table.
    pub fn name(&self) -> &str {
        self.name
    }

    /// Returns the partition key of the table.
    pub fn partition_key(&self) -> &str {
        self.partition_key
    }

    /// Returns the sort key of the table, if any.
    pub fn sort_key(&self) -> Option<&str> {
        self.sort_key
    }

    pub fn key_type(&self) -> FieldType {
        self.key_type
    }

    pub fn stream(&self) -> Option<StreamView> {
        self.stream
    }

    pub fn ttl_attribute(&self) -> Option<&str> {
        self.ttl_attribute
    }

    pub fn point_in_time_recovery(&self) -> bool {
        self.point_in_time_recovery
    }

    /// Key attributes in key schema order: partition key first.
    pub fn keys(&self) -> Vec<(&str, KeyRole)> {
        let mut keys = vec![(self.partition_key, KeyRole::Hash)];
        if let Some(sort_key) = self.sort_key {
            keys.push((sort_key, KeyRole::Range));
        }
        keys
    }

    pub(crate) fn key_schema(&self) -> Result<Vec<KeySchemaElement>> {
        self.keys()
            .into_iter()
            .map(|(name, role)| {
                KeySchemaElement::builder()
                    .attribute_name(name)
                    .key_type(role.to_key_type())
                    .build()
                    .map_err(Error::dynamodb)
            })
            .collect()
    }

    pub(crate) fn attribute_definitions(&self) -> Result<Vec<AttributeDefinition>> {
        self.keys()
            .into_iter()
            .map(|(name, _)| {
                AttributeDefinition::builder()
                    .attribute_name(name)
                    .attribute_type(self.key_type.to_scalar())
                    .build()
                    .map_err(Error::dynamodb)
            })
            .collect()
    }

    pub(crate) fn stream_specification(&self) -> Result<Option<StreamSpecification>> {
        self.stream
            .map(|view| {
                StreamSpecification::builder()
                    .stream_enabled(true)
                    .stream_view_type(view.to_view_type())
                    .build()
                    .map_err(Error::dynamodb)
            })
            .transpose()
    }
}
