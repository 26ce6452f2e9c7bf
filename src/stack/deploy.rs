use aws_sdk_s3::types::BucketVersioningStatus;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::ConnectionConfig;
use crate::dynamodb::{FieldType, KeyAttribute};
use crate::error::Result;
use crate::provision::CreateOutcome;
use crate::stack::StackDefinition;

/// What [`deploy`] did for each resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeployReport {
    pub bucket: CreateOutcome,
    pub table: CreateOutcome,
}

/// Applies `stack` to the endpoint `config` points at.
///
/// Existing resources are kept and their settings re-applied.
pub async fn deploy(config: &ConnectionConfig, stack: &StackDefinition<'_>) -> Result<DeployReport> {
    info!("Deploying {} to {}", stack.name, config.target_display());

    let bucket = config.s3()?.apply(&stack.bucket, config.region()).await?;
    info!("{} '{}': {bucket}", stack.bucket_id, stack.bucket.name());

    let table = config.dynamodb()?.apply(&stack.table).await?;
    info!("{} '{}': {table}", stack.table_id, stack.table.name());

    Ok(DeployReport { bucket, table })
}

/// A key attribute as found on the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyStatus {
    pub name: String,
    pub key_type: &'static str,
    pub attribute_type: Option<&'static str>,
}

impl From<&KeyAttribute> for KeyStatus {
    fn from(key: &KeyAttribute) -> Self {
        Self {
            name: key.name.clone(),
            key_type: key.role.code(),
            attribute_type: key.field_type.map(FieldType::code),
        }
    }
}

/// Observed state of a stack's resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackStatus {
    pub bucket: String,
    pub bucket_exists: bool,
    pub bucket_versioning: Option<String>,
    pub table: String,
    pub table_exists: bool,
    pub table_keys: Vec<KeyStatus>,
}

impl StackStatus {
    /// Lists every way the observed state differs from `stack`; empty when it matches.
    pub fn problems(&self, stack: &StackDefinition<'_>) -> Vec<String> {
        let mut problems = Vec::new();

        if !self.bucket_exists {
            problems.push(format!("bucket '{}' is missing", self.bucket));
        } else if stack.bucket.is_versioned()
            && self.bucket_versioning.as_deref() != Some(BucketVersioningStatus::Enabled.as_str())
        {
            problems.push(format!(
                "bucket '{}' versioning is {}",
                self.bucket,
                self.bucket_versioning.as_deref().unwrap_or("not configured")
            ));
        }

        if !self.table_exists {
            problems.push(format!("table '{}' is missing", self.table));
            return problems;
        }

        let expected: Vec<KeyStatus> = stack
            .table
            .keys()
            .into_iter()
            .map(|(name, role)| KeyStatus {
                name: name.to_string(),
                key_type: role.code(),
                attribute_type: Some(stack.table.key_type().code()),
            })
            .collect();
        if self.table_keys != expected {
            problems.push(format!(
                "table '{}' key schema is [{}], expected [{}]",
                self.table,
                describe_keys(&self.table_keys),
                describe_keys(&expected)
            ));
        }

        problems
    }
}

fn describe_keys(keys: &[KeyStatus]) -> String {
    keys.iter()
        .map(|key| {
            format!(
                "{} {} {}",
                key.name,
                key.key_type,
                key.attribute_type.unwrap_or("?")
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Inspects the endpoint for the resources of `stack`.
pub async fn verify(config: &ConnectionConfig, stack: &StackDefinition<'_>) -> Result<StackStatus> {
    let s3 = config.s3()?;
    let bucket_name = stack.bucket.name();

    let bucket_exists = s3.list_buckets().await?.iter().any(|b| b == bucket_name);
    let bucket_versioning = if bucket_exists {
        s3.versioning_status(bucket_name)
            .await?
            .map(|status| status.as_str().to_string())
    } else {
        None
    };

    let ddb = config.dynamodb()?;
    let table_name = stack.table.name();

    let table_exists = ddb.table_exists(table_name).await?;
    let table_keys = if table_exists {
        ddb.key_attributes(table_name)
            .await?
            .iter()
            .map(KeyStatus::from)
            .collect()
    } else {
        Vec::new()
    };

    Ok(StackStatus {
        bucket: bucket_name.to_string(),
        bucket_exists,
        bucket_versioning,
        table: table_name.to_string(),
        table_exists,
        table_keys,
    })
}

/// What [`teardown`] removed, and how many deletions failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeardownReport {
    pub buckets_deleted: Vec<String>,
    pub tables_deleted: Vec<String>,
    pub failures: usize,
}

/// Deletes every bucket and table on the endpoint.
///
/// Individual failures are logged and counted, never returned; only a
/// failure to list the resources aborts the teardown.
pub async fn teardown(config: &ConnectionConfig) -> Result<TeardownReport> {
    let mut report = TeardownReport::default();

    let s3 = config.s3()?;
    for bucket in s3.list_buckets().await? {
        match s3.delete_bucket(&bucket).await {
            Ok(()) => report.buckets_deleted.push(bucket),
            Err(e) => {
                warn!("Failed to clean up bucket '{bucket}': {e}");
                report.failures += 1;
            }
        }
    }

    let ddb = config.dynamodb()?;
    for table in ddb.list_tables().await? {
        match ddb.delete_table(&table).await {
            Ok(()) => report.tables_deleted.push(table),
            Err(e) => {
                warn!("Failed to clean up table '{table}': {e}");
                report.failures += 1;
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamodb::KeyRole;
    use crate::stack::base_stack;

    fn key(name: &str, role: KeyRole) -> KeyStatus {
        KeyStatus::from(&KeyAttribute {
            name: name.to_string(),
            role,
            field_type: Some(FieldType::String),
        })
    }

    fn healthy() -> StackStatus {
        StackStatus {
            bucket: "my-application-storage".to_string(),
            bucket_exists: true,
            bucket_versioning: Some("Enabled".to_string()),
            table: "users".to_string(),
            table_exists: true,
            table_keys: vec![key("user_id", KeyRole::Hash), key("email", KeyRole::Range)],
        }
    }

    #[test]
    fn test_matching_status_has_no_problems() {
        assert!(healthy().problems(&base_stack()).is_empty());
    }

    #[test]
    fn test_reports_missing_resources() {
        let status = StackStatus {
            bucket_exists: false,
            bucket_versioning: None,
            table_exists: false,
            table_keys: Vec::new(),
            ..healthy()
        };

        let problems = status.problems(&base_stack());
        assert_eq!(
            problems,
            vec![
                "bucket 'my-application-storage' is missing".to_string(),
                "table 'users' is missing".to_string(),
            ]
        );
    }

    #[test]
    fn test_reports_disabled_versioning() {
        let status = StackStatus {
            bucket_versioning: None,
            ..healthy()
        };

        let problems = status.problems(&base_stack());
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("not configured"));
    }

    #[test]
    fn test_reports_wrong_key_schema() {
        let status = StackStatus {
            table_keys: vec![key("user_id", KeyRole::Hash)],
            ..healthy()
        };

        let problems = status.problems(&base_stack());
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("expected [user_id HASH S, email RANGE S]"));
    }
}
