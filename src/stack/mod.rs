//! Declarative description of the application's infrastructure.
//!
//! [`base_stack`] is pure data. [`synth`] renders it as a CloudFormation
//! template for real deployments; [`deploy`], [`verify`] and [`teardown`]
//! apply, inspect and remove it on the emulator.

mod deploy;
mod synth;

pub use deploy::{deploy, teardown, verify, DeployReport, KeyStatus, StackStatus, TeardownReport};
pub use synth::synth;

use crate::dynamodb::{StreamView, TableDefinition};
use crate::provision::{users_table, BUCKET_NAME};
use crate::s3::{BucketDefinition, BucketEncryption, CorsRuleDefinition};

pub const STACK_NAME: &str = "BaseInfrastructureStack";
pub const TTL_ATTRIBUTE: &str = "ttl";

/// A bucket and a table, each with the CloudFormation logical id it is rendered under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackDefinition<'a> {
    pub name: &'a str,
    pub bucket_id: &'a str,
    pub bucket: BucketDefinition<'a>,
    pub table_id: &'a str,
    pub table: TableDefinition<'a>,
}

/// The base stack: the `init` resources hardened for production use.
pub fn base_stack() -> StackDefinition<'static> {
    StackDefinition {
        name: STACK_NAME,
        bucket_id: "StorageBucket",
        bucket: BucketDefinition::new(BUCKET_NAME)
            .versioned()
            .with_encryption(BucketEncryption::S3Managed)
            .enforce_ssl()
            .block_public_access()
            .with_cors_rule(CorsRuleDefinition {
                allowed_methods: vec!["GET"],
                allowed_origins: vec!["*"],
                allowed_headers: vec!["*"],
                max_age_seconds: 3000,
            }),
        table_id: "UserTable",
        table: users_table()
            .with_point_in_time_recovery()
            .with_stream(StreamView::NewAndOldImages)
            .with_ttl_attribute(TTL_ATTRIBUTE),
    }
}
