use aws_sdk_dynamodb::{
    error::SdkError,
    operation::create_table::CreateTableError,
    types::{
        BillingMode, PointInTimeRecoverySpecification, StreamSpecification, TableDescription,
        TableStatus, TimeToLiveSpecification, TimeToLiveStatus,
    },
    Client,
};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::dynamodb::{key_attributes, KeyAttribute, StreamView, TableDefinition};
use crate::error::{Error, Result};
use crate::provision::CreateOutcome;
use crate::utils::retry_with_backoff;

const ACTIVE_POLL_DELAY: Duration = Duration::from_millis(250);
const ACTIVE_POLL_RETRIES: usize = 8;

/// DynamoDB resource handle for table-level operations.
///
/// This struct provides a convenient interface for managing tables,
/// abstracting away the builder boilerplate of the AWS SDK.
///
/// # Features
///
/// - Table management: Create, delete, list, and check existence of tables
/// - Table features: Point-in-time recovery, time to live and streams
/// - Inspection: Describe a table and report its key attributes
/// - Authentication: Verify credentials against the endpoint
///
/// # DynamoDB Concepts
///
/// ## Tables
/// A table is a collection of items, and each item consists of attributes.
/// Only the key attributes are declared up front; everything else is schemaless.
///
/// ## Table Status
/// A freshly created table is `CREATING` until DynamoDB finishes allocating it.
/// Settings such as point-in-time recovery can only be changed once it is `ACTIVE`,
/// see [`DynamoDb::wait_for_active`].
///
/// # Example
///
/// ```no_run
/// use aws_local_dev::ConnectionConfig;
/// use aws_local_dev::dynamodb::TableDefinition;
///
/// # async fn example() -> aws_local_dev::Result<()> {
/// let config = ConnectionConfig::from_env()?;
/// let ddb = config.dynamodb()?;
///
/// let table = TableDefinition::new("users", "user_id", Some("email"));
/// ddb.create_table(&table).await?;
///
/// for key in ddb.key_attributes("users").await? {
///     println!("{} ({:?})", key.name, key.role);
/// }
/// # Ok(())
/// # }
/// ```
///
/// # Error Handling
///
/// Methods return [`crate::Result`]; SDK failures are flattened into
/// [`Error::DynamoDb`] with the full error chain in the message.
#[derive(Debug, Clone)]
pub struct DynamoDb {
    client: Client,
}

impl DynamoDb {
    /// Wraps an already configured client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// The underlying SDK client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Verifies authentication by attempting to list tables.
    pub async fn check_auth(&self) -> Result<()> {
        self.client.list_tables().send().await.map_err(|e| {
            error!("Authentication failed: {}", e);
            Error::dynamodb(e)
        })?;
        info!("Authentication successful");
        Ok(())
    }

    // --- Table Operations ---

    /// Creates a table, reporting an existing one as [`CreateOutcome::AlreadyExists`].
    pub async fn create_table(&self, table: &TableDefinition<'_>) -> Result<CreateOutcome> {
        let result = self
            .client
            .create_table()
            .table_name(table.name())
            .billing_mode(BillingMode::PayPerRequest)
            .set_attribute_definitions(Some(table.attribute_definitions()?))
            .set_key_schema(Some(table.key_schema()?))
            .set_stream_specification(table.stream_specification()?)
            .send()
            .await;

        match result {
            Ok(_) => {
                info!("Table '{}' created", table.name());
                Ok(CreateOutcome::Created)
            }
            Err(err) if is_resource_in_use(&err) => {
                info!("Table '{}' already exists", table.name());
                Ok(CreateOutcome::AlreadyExists)
            }
            Err(err) => Err(Error::dynamodb(err)),
        }
    }

    /// Deletes a table.
    pub async fn delete_table(&self, table_name: &str) -> Result<()> {
        self.client
            .delete_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(Error::dynamodb)?;
        info!("Table '{table_name}' deleted");
        Ok(())
    }

    /// Checks if a table exists.
    pub async fn table_exists(&self, table_name: &str) -> Result<bool> {
        let tables = self.list_tables().await?;
        Ok(tables.iter().any(|name| name == table_name))
    }

    /// Lists all table names, following pagination.
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut last_evaluated = None;

        loop {
            let response = self
                .client
                .list_tables()
                .set_exclusive_start_table_name(last_evaluated)
                .send()
                .await
                .map_err(Error::dynamodb)?;

            names.extend(response.table_names().iter().cloned());
            last_evaluated = response.last_evaluated_table_name().map(str::to_string);

            if last_evaluated.is_none() {
                break;
            }
        }

        Ok(names)
    }

    /// Retrieves table description.
    pub async fn describe_table(&self, table_name: &str) -> Result<TableDescription> {
        let output = self
            .client
            .describe_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(Error::dynamodb)?;

        output
            .table()
            .cloned()
            .ok_or_else(|| Error::DynamoDb(format!("no description returned for '{table_name}'")))
    }

    /// Reports the key attributes of a table in key schema order.
    pub async fn key_attributes(&self, table_name: &str) -> Result<Vec<KeyAttribute>> {
        let description = self.describe_table(table_name).await?;
        Ok(key_attributes(&description))
    }

    /// Polls until the table reports `ACTIVE`.
    pub async fn wait_for_active(&self, table_name: &str) -> Result<()> {
        retry_with_backoff(
            || async move {
                let description = self.describe_table(table_name).await?;
                match description.table_status() {
                    Some(TableStatus::Active) => Ok(()),
                    status => {
                        debug!("Table '{table_name}' status: {:?}", status);
                        Err(Error::TableNotActive {
                            table_name: table_name.to_string(),
                        })
                    }
                }
            },
            ACTIVE_POLL_DELAY,
            ACTIVE_POLL_RETRIES,
        )
        .await
    }

    // --- Table Features ---

    pub async fn enable_point_in_time_recovery(&self, table_name: &str) -> Result<()> {
        self.client
            .update_continuous_backups()
            .table_name(table_name)
            .point_in_time_recovery_specification(
                PointInTimeRecoverySpecification::builder()
                    .point_in_time_recovery_enabled(true)
                    .build()
                    .map_err(Error::dynamodb)?,
            )
            .send()
            .await
            .map_err(Error::dynamodb)?;
        debug!("Point-in-time recovery enabled on '{table_name}'");
        Ok(())
    }

    pub async fn enable_ttl(&self, table_name: &str, attribute: &str) -> Result<()> {
        let current = self
            .client
            .describe_time_to_live()
            .table_name(table_name)
            .send()
            .await
            .map_err(Error::dynamodb)?;
        let already_enabled = current.time_to_live_description().is_some_and(|ttl| {
            ttl.time_to_live_status() == Some(&TimeToLiveStatus::Enabled)
                && ttl.attribute_name() == Some(attribute)
        });

        // UpdateTimeToLive rejects a request that changes nothing.
        if already_enabled {
            debug!("TTL on '{table_name}' already uses '{attribute}'");
            return Ok(());
        }

        self.client
            .update_time_to_live()
            .table_name(table_name)
            .time_to_live_specification(
                TimeToLiveSpecification::builder()
                    .enabled(true)
                    .attribute_name(attribute)
                    .build()
                    .map_err(Error::dynamodb)?,
            )
            .send()
            .await
            .map_err(Error::dynamodb)?;
        debug!("TTL enabled on '{table_name}' using '{attribute}'");
        Ok(())
    }

    /// Turns on the table stream with `view`, replacing a stream with another view.
    pub async fn enable_stream(&self, table_name: &str, view: StreamView) -> Result<()> {
        let description = self.describe_table(table_name).await?;
        let current = description
            .stream_specification()
            .filter(|spec| spec.stream_enabled())
            .and_then(|spec| spec.stream_view_type());

        if current == Some(&view.to_view_type()) {
            debug!("Stream on '{table_name}' already uses {}", view.code());
            return Ok(());
        }
        // The view type of a live stream cannot be changed in place.
        if current.is_some() {
            self.update_stream(table_name, None).await?;
        }
        self.update_stream(table_name, Some(view)).await?;
        info!("Stream enabled on '{table_name}' with {}", view.code());
        Ok(())
    }

    async fn update_stream(&self, table_name: &str, view: Option<StreamView>) -> Result<()> {
        let mut spec = StreamSpecification::builder().stream_enabled(view.is_some());
        if let Some(view) = view {
            spec = spec.stream_view_type(view.to_view_type());
        }

        self.client
            .update_table()
            .table_name(table_name)
            .stream_specification(spec.build().map_err(Error::dynamodb)?)
            .send()
            .await
            .map_err(Error::dynamodb)?;
        self.wait_for_active(table_name).await
    }

    /// Creates the table described by `table`, waits for it and enables its features.
    ///
    /// An existing table is brought in line with the definition's stream,
    /// point-in-time recovery and TTL settings. Its key schema is left as is.
    pub async fn apply(&self, table: &TableDefinition<'_>) -> Result<CreateOutcome> {
        let outcome = self.create_table(table).await?;
        self.wait_for_active(table.name()).await?;

        if let Some(view) = table.stream() {
            self.enable_stream(table.name(), view).await?;
        }

        if table.point_in_time_recovery() {
            self.enable_point_in_time_recovery(table.name()).await?;
        }
        if let Some(attribute) = table.ttl_attribute() {
            self.enable_ttl(table.name(), attribute).await?;
        }

        Ok(outcome)
    }
}

fn is_resource_in_use<R>(err: &SdkError<CreateTableError, R>) -> bool {
    err.as_service_error()
        .is_some_and(|service_err| service_err.is_resource_in_use_exception())
}
