//! The `init` flow: creates the application bucket and the users table.

use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::ConnectionConfig;
use crate::dynamodb::TableDefinition;
use crate::error::Error;

pub const BUCKET_NAME: &str = "my-application-storage";
pub const TABLE_NAME: &str = "users";
pub const PARTITION_KEY: &str = "user_id";
pub const SORT_KEY: &str = "email";

/// Result of a create call that tolerates an existing resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
}

impl fmt::Display for CreateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreateOutcome::Created => f.write_str("created"),
            CreateOutcome::AlreadyExists => f.write_str("already exists"),
        }
    }
}

/// Per-resource results of [`provision`].
///
/// Each resource is attempted independently, so one may have failed while
/// the other succeeded.
#[derive(Debug)]
pub struct ProvisionReport {
    pub bucket: Result<CreateOutcome, Error>,
    pub table: Result<CreateOutcome, Error>,
}

impl ProvisionReport {
    pub fn is_success(&self) -> bool {
        self.bucket.is_ok() && self.table.is_ok()
    }
}

/// The table created by `init`: composite string key, on-demand billing.
pub fn users_table() -> TableDefinition<'static> {
    TableDefinition::new(TABLE_NAME, PARTITION_KEY, Some(SORT_KEY))
}

/// Creates the bucket and the table.
///
/// The bucket goes to `config`'s region. A failure creating the bucket
/// does not stop the table from being attempted.
pub async fn provision(config: &ConnectionConfig) -> ProvisionReport {
    info!("Provisioning against {}", config.target_display());

    let bucket = match config.s3() {
        Ok(s3) => s3.create_bucket(BUCKET_NAME, config.region()).await,
        Err(e) => Err(e),
    };
    if let Err(e) = &bucket {
        warn!("Creating bucket '{BUCKET_NAME}' failed: {e}");
    }

    let table = match config.dynamodb() {
        Ok(ddb) => ddb.create_table(&users_table()).await,
        Err(e) => Err(e),
    };
    if let Err(e) = &table {
        warn!("Creating table '{TABLE_NAME}' failed: {e}");
    }

    ProvisionReport { bucket, table }
}
