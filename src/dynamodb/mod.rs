//! # DynamoDB Module
//!
//! This module provides a high-level interface for managing Amazon DynamoDB
//! tables on the local emulator.
//!
//! ## Components
//!
//! - `DynamoDb`: A resource handle for performing table operations.
//! - `TableDefinition`: Represents a table's keys and table-level features.
//! - `FieldType` / `KeyRole`: Key attribute type and role in the primary key.
//! - `KeyAttribute`: A key attribute as reported back by `DescribeTable`.
//!
//! ## Usage
//!
//! Handles are obtained through [`crate::ConnectionConfig`], which reads the
//! following environment variables once at startup:
//!
//! - `AWS_DEFAULT_REGION`: The region (defaults to `us-east-1`).
//! - `LOCALSTACK_HOSTNAME`: The emulator host (defaults to `localhost`, port 4566).
//! - `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY`: Defaults to `test` / `test`.
//!
//! ## Example
//!
//! ```no_run
//! use aws_local_dev::ConnectionConfig;
//! use aws_local_dev::dynamodb::{StreamView, TableDefinition};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConnectionConfig::from_env()?;
//!     let ddb = config.dynamodb()?;
//!
//!     // Define the table
//!     let table = TableDefinition::new("users", "user_id", Some("email"))
//!         .with_stream(StreamView::NewAndOldImages)
//!         .with_ttl_attribute("ttl");
//!
//!     // Create it and switch on its features
//!     ddb.apply(&table).await?;
//!
//!     Ok(())
//! }
//! ```

mod resource;
mod schema;
mod table;

pub use resource::DynamoDb;
pub use schema::{key_attributes, FieldType, KeyAttribute, KeyRole};
pub use table::{StreamView, TableDefinition};
