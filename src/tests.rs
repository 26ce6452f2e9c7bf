//! Tests for the client factory and the provisioning flows
//!
//! These tests cover:
//! - Client and resource caching per connection config
//! - The region rule for bucket location constraints
//! - Table definitions and key attribute extraction
//! - End-to-end provisioning, deployment and verification
//!
//! # Setup
//!
//! The end-to-end tests need a running emulator on port 4566 and are marked
//! `#[ignore]`. Connection settings come from the same variables the binary
//! reads (a `.env` file works too):
//!
//! ```text
//! LOCALSTACK_HOSTNAME=localhost
//! AWS_DEFAULT_REGION=us-east-1
//! ```
//!
//! Credentials default to `test` / `test`.
//!
//! # Running Tests
//!
//! ```text
//! cargo test -- --include-ignored
//! ```
//!
//! Note: the end-to-end tests delete every bucket and table on the emulator.

use std::sync::{Arc, Once};

use anyhow::Result;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, KeySchemaElement, KeyType, ScalarAttributeType, StreamViewType,
    TableDescription,
};
use tokio::sync::Mutex;
use tracing::{info, instrument};

use crate::dynamodb::{key_attributes, FieldType, KeyAttribute, KeyRole, StreamView, TableDefinition};
use crate::provision::{self, CreateOutcome, BUCKET_NAME, TABLE_NAME};
use crate::s3::{create_bucket_configuration, location_constraint};
use crate::stack;
use crate::{
    ConnectionConfig, Error, LocalCredentials, ServiceClient, ServiceName, ServiceResource,
};

static INIT: Once = Once::new();
// The end-to-end tests share one emulator and wipe it; run them one at a time.
static EMULATOR: Mutex<()> = Mutex::const_new(());

fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .init();
    });
}

fn local_config() -> ConnectionConfig {
    ConnectionConfig::new(
        "us-east-1",
        "http://localhost:4566",
        LocalCredentials::default(),
    )
    .unwrap()
}

fn emulator_config() -> ConnectionConfig {
    init_tracing();
    dotenv::dotenv().ok();
    ConnectionConfig::from_env().unwrap()
}

// --- Client factory ---

#[tokio::test]
async fn test_get_client_returns_cached_handle() {
    let config = local_config();

    for service in ServiceName::ALL {
        let first = config.get_client(service).unwrap();
        let second = config.get_client(service).unwrap();

        assert!(Arc::ptr_eq(&first, &second), "{service} client was rebuilt");
        assert_eq!(first.service(), service);
    }
    assert_eq!(config.clients.len(), 2);
}

#[tokio::test]
async fn test_client_and_resource_caches_are_independent() {
    let config = local_config();

    config.get_client(ServiceName::S3).unwrap();
    assert!(config.clients.contains(ServiceName::S3));
    assert!(config.resources.is_empty());

    let resource = config.get_resource(ServiceName::DynamoDb).unwrap();
    assert!(matches!(*resource, ServiceResource::DynamoDb(_)));
    assert!(!config.clients.contains(ServiceName::DynamoDb));
    assert_eq!(config.resources.len(), 1);

    let again = config.get_resource(ServiceName::DynamoDb).unwrap();
    assert!(Arc::ptr_eq(&resource, &again));
}

#[tokio::test]
async fn test_typed_accessors() {
    let config = local_config();

    let handle = config.get_client(ServiceName::DynamoDb).unwrap();
    assert!(matches!(*handle, ServiceClient::DynamoDb(_)));
    assert!(handle.as_s3().is_none());

    config.s3_client().unwrap();
    config.dynamodb_client().unwrap();
    config.s3().unwrap();
    config.dynamodb().unwrap();
    assert_eq!(config.clients.len(), 2);
    assert_eq!(config.resources.len(), 2);
}

#[tokio::test]
async fn test_client_uses_config_region() {
    let config = local_config().with_region("eu-central-1");
    let client = config.s3_client().unwrap();

    assert_eq!(
        client.config().region().map(|r| r.as_ref()),
        Some("eu-central-1")
    );
}

#[tokio::test]
async fn test_with_region_resets_caches() {
    let config = local_config();
    config.get_client(ServiceName::S3).unwrap();

    let config = config.with_region("eu-west-1");
    assert_eq!(config.region(), "eu-west-1");
    assert!(config.clients.is_empty());
}

// --- Provisioning ---

#[tokio::test]
async fn test_provision_attempts_table_after_bucket_failure() {
    init_tracing();
    // Nothing listens on port 1, so every call fails to connect.
    let config = ConnectionConfig::new(
        "eu-west-1",
        "http://127.0.0.1:1",
        LocalCredentials::default(),
    )
    .unwrap();

    let report = provision::provision(&config).await;

    assert!(!report.is_success());
    assert!(matches!(report.bucket, Err(Error::S3(_))), "{report:?}");
    assert!(matches!(report.table, Err(Error::DynamoDb(_))), "{report:?}");
}

// --- Bucket location ---

#[test]
fn test_us_east_1_has_no_location_constraint() {
    assert!(location_constraint("us-east-1").is_none());
    assert!(create_bucket_configuration("us-east-1").is_none());
}

#[test]
fn test_other_regions_use_matching_location_constraint() {
    for region in ["eu-west-1", "ap-southeast-2", "us-west-2"] {
        let constraint = location_constraint(region).unwrap();
        assert_eq!(constraint.as_str(), region);

        let configuration = create_bucket_configuration(region).unwrap();
        assert_eq!(
            configuration.location_constraint().map(|c| c.as_str()),
            Some(region)
        );
    }
}

// --- Table definitions ---

#[test]
fn test_users_table_definition() {
    let table = provision::users_table();

    assert_eq!(table.name(), "users");
    assert_eq!(
        table.keys(),
        vec![("user_id", KeyRole::Hash), ("email", KeyRole::Range)]
    );
    assert_eq!(table.key_type(), FieldType::String);
    assert!(table.stream().is_none());
    assert!(!table.point_in_time_recovery());

    let key_schema = table.key_schema().unwrap();
    assert_eq!(key_schema.len(), 2);
    assert_eq!(key_schema[1].key_type(), &KeyType::Range);

    let definitions = table.attribute_definitions().unwrap();
    assert!(definitions
        .iter()
        .all(|d| d.attribute_type() == &ScalarAttributeType::S));
}

#[test]
fn test_table_without_sort_key() {
    let table = TableDefinition::new("events", "event_id", None).with_key_type(FieldType::Number);

    assert_eq!(table.keys(), vec![("event_id", KeyRole::Hash)]);
    assert_eq!(
        table.attribute_definitions().unwrap()[0].attribute_type(),
        &ScalarAttributeType::N
    );
    assert!(table.stream_specification().unwrap().is_none());
}

#[test]
fn test_stream_specification() {
    let table = provision::users_table().with_stream(StreamView::NewAndOldImages);
    let spec = table.stream_specification().unwrap().unwrap();

    assert!(spec.stream_enabled());
    assert_eq!(spec.stream_view_type().map(|v| v.as_str()), Some("NEW_AND_OLD_IMAGES"));
}

#[test]
fn test_key_attributes_from_description() {
    let description = TableDescription::builder()
        .key_schema(
            KeySchemaElement::builder()
                .attribute_name("user_id")
                .key_type(KeyType::Hash)
                .build()
                .unwrap(),
        )
        .key_schema(
            KeySchemaElement::builder()
                .attribute_name("email")
                .key_type(KeyType::Range)
                .build()
                .unwrap(),
        )
        .attribute_definitions(
            AttributeDefinition::builder()
                .attribute_name("email")
                .attribute_type(ScalarAttributeType::S)
                .build()
                .unwrap(),
        )
        .build();

    assert_eq!(
        key_attributes(&description),
        vec![
            KeyAttribute {
                name: "user_id".to_string(),
                role: KeyRole::Hash,
                field_type: None,
            },
            KeyAttribute {
                name: "email".to_string(),
                role: KeyRole::Range,
                field_type: Some(FieldType::String),
            },
        ]
    );
}

// --- End to end ---

#[tokio::test]
#[ignore = "requires running emulator"]
#[instrument]
async fn test_provision_twice_reports_existing_resources() -> Result<()> {
    let _guard = EMULATOR.lock().await;
    let config = emulator_config();

    info!("Cleaning emulator");
    stack::teardown(&config).await?;

    info!("First provisioning run");
    let first = provision::provision(&config).await;
    assert_eq!(first.bucket?, CreateOutcome::Created);
    assert_eq!(first.table?, CreateOutcome::Created);

    info!("Second provisioning run");
    let second = provision::provision(&config).await;
    assert_eq!(second.bucket?, CreateOutcome::AlreadyExists);
    assert_eq!(second.table?, CreateOutcome::AlreadyExists);

    Ok(())
}

#[tokio::test]
#[ignore = "requires running emulator"]
async fn test_provisioned_resources_exist() -> Result<()> {
    let _guard = EMULATOR.lock().await;
    let config = emulator_config();

    let report = provision::provision(&config).await;
    assert!(report.is_success(), "{report:?}");

    let buckets = config.s3()?.list_buckets().await?;
    assert!(buckets.iter().any(|b| b == BUCKET_NAME));

    let ddb = config.dynamodb()?;
    ddb.check_auth().await?;
    assert!(ddb.table_exists(TABLE_NAME).await?);

    Ok(())
}

#[tokio::test]
#[ignore = "requires running emulator"]
async fn test_provisioned_table_key_schema() -> Result<()> {
    let _guard = EMULATOR.lock().await;
    let config = emulator_config();

    let report = provision::provision(&config).await;
    assert!(report.table.is_ok(), "{report:?}");

    let keys = config.dynamodb()?.key_attributes(TABLE_NAME).await?;
    assert_eq!(keys.len(), 2);
    assert_eq!(keys[0].name, "user_id");
    assert_eq!(keys[0].role, KeyRole::Hash);
    assert_eq!(keys[1].name, "email");
    assert_eq!(keys[1].role, KeyRole::Range);
    assert!(keys
        .iter()
        .all(|key| key.field_type == Some(FieldType::String)));

    Ok(())
}

#[tokio::test]
#[ignore = "requires running emulator"]
async fn test_deploy_matches_stack() -> Result<()> {
    let _guard = EMULATOR.lock().await;
    let config = emulator_config();
    let base = stack::base_stack();

    stack::deploy(&config, &base).await?;
    // A second deploy converges instead of failing.
    let report = stack::deploy(&config, &base).await?;
    assert_eq!(report.bucket, CreateOutcome::AlreadyExists);
    assert_eq!(report.table, CreateOutcome::AlreadyExists);

    let status = stack::verify(&config, &base).await?;
    assert_eq!(status.bucket_versioning.as_deref(), Some("Enabled"));
    assert_eq!(status.problems(&base), Vec::<String>::new());

    Ok(())
}

#[tokio::test]
#[ignore = "requires running emulator"]
async fn test_deploy_updates_table_created_by_provision() -> Result<()> {
    let _guard = EMULATOR.lock().await;
    let config = emulator_config();

    stack::teardown(&config).await?;
    let report = provision::provision(&config).await;
    assert_eq!(report.table?, CreateOutcome::Created);

    let ddb = config.dynamodb()?;
    let before = ddb.describe_table(TABLE_NAME).await?;
    assert!(before
        .stream_specification()
        .map_or(true, |spec| !spec.stream_enabled()));

    let deployed = stack::deploy(&config, &stack::base_stack()).await?;
    assert_eq!(deployed.table, CreateOutcome::AlreadyExists);

    let after = ddb.describe_table(TABLE_NAME).await?;
    let spec = after.stream_specification().expect("stream specification");
    assert!(spec.stream_enabled());
    assert_eq!(spec.stream_view_type(), Some(&StreamViewType::NewAndOldImages));

    Ok(())
}

#[tokio::test]
#[ignore = "requires running emulator"]
async fn test_teardown_removes_everything() -> Result<()> {
    let _guard = EMULATOR.lock().await;
    let config = emulator_config();

    let report = provision::provision(&config).await;
    assert!(report.is_success(), "{report:?}");

    let teardown = stack::teardown(&config).await?;
    assert_eq!(teardown.failures, 0);
    assert!(teardown.tables_deleted.iter().any(|t| t == TABLE_NAME));

    let status = stack::verify(&config, &stack::base_stack()).await?;
    assert!(!status.bucket_exists);
    assert!(!status.table_exists);

    Ok(())
}
