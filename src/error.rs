//! Error types shared by the client factory, the resource handles and the
//! provisioning flows.

use thiserror::Error;

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building clients or talking to the emulator.
#[derive(Error, Debug)]
pub enum Error {
    #[error("unsupported service '{0}' (expected one of: s3, dynamodb)")]
    UnsupportedService(String),

    #[error("invalid endpoint url '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("S3 error: {0}")]
    S3(String),

    #[error("DynamoDB error: {0}")]
    DynamoDb(String),

    #[error("table '{table_name}' did not become active")]
    TableNotActive { table_name: String },
}

impl Error {
    pub(crate) fn s3(err: impl std::error::Error) -> Self {
        Error::S3(aws_sdk_s3::error::DisplayErrorContext(err).to_string())
    }

    pub(crate) fn dynamodb(err: impl std::error::Error) -> Self {
        Error::DynamoDb(aws_sdk_dynamodb::error::DisplayErrorContext(err).to_string())
    }
}
