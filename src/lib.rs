//! Provisions a fixed set of mock AWS resources (one S3 bucket, one
//! DynamoDB table) on a local emulator, and describes the same resources as
//! an infrastructure stack for real deployments.
//!
//! Everything starts from a [`ConnectionConfig`]: build it once with
//! [`ConnectionConfig::from_env`], then ask it for clients or resource
//! handles.
//!
//! ```no_run
//! use aws_local_dev::{ConnectionConfig, ServiceName};
//!
//! # async fn example() -> aws_local_dev::Result<()> {
//! let config = ConnectionConfig::from_env()?;
//!
//! let client = config.get_client(ServiceName::S3)?;
//! let again = config.get_client(ServiceName::S3)?;
//! assert!(std::sync::Arc::ptr_eq(&client, &again));
//!
//! let report = aws_local_dev::provision::provision(&config).await;
//! assert!(report.is_success());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod clients;
pub mod config;
pub mod dynamodb;
pub mod error;
pub mod provision;
pub mod s3;
pub mod service;
pub mod stack;
mod utils;

#[cfg(test)]
mod tests;

pub use clients::{ServiceClient, ServiceResource};
pub use config::{ClientPolicy, ConnectionConfig, LocalCredentials, DEFAULT_REGION};
pub use error::{Error, Result};
pub use service::ServiceName;
