//! # S3 Module
//!
//! Bucket-level operations for the local emulator.
//!
//! - `S3`: resource handle wrapping an SDK client.
//! - `BucketDefinition`: a bucket plus the settings applied after creation.
//! - `location_constraint`: region rule used by `CreateBucket`.

mod bucket;
mod resource;

pub use bucket::{
    create_bucket_configuration, location_constraint, ssl_only_policy, BucketDefinition,
    BucketEncryption, CorsRuleDefinition, DEFAULT_BUCKET_REGION,
};
pub use resource::S3;
