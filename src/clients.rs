//! Client factory: builds SDK clients and resource handles for a
//! [`ConnectionConfig`] and memoizes them per service.

use std::sync::Arc;

use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_smithy_runtime::client::http::hyper_014::HyperClientBuilder;
use aws_smithy_runtime_api::client::http::SharedHttpClient;
use tracing::debug;

use crate::config::ConnectionConfig;
use crate::dynamodb::DynamoDb;
use crate::error::{Error, Result};
use crate::s3::S3;
use crate::service::ServiceName;

const CREDENTIALS_PROVIDER: &str = "aws-local-dev";

/// A low-level SDK client, one operation per API action.
#[derive(Debug, Clone)]
pub enum ServiceClient {
    S3(aws_sdk_s3::Client),
    DynamoDb(aws_sdk_dynamodb::Client),
}

impl ServiceClient {
    pub fn service(&self) -> ServiceName {
        match self {
            ServiceClient::S3(_) => ServiceName::S3,
            ServiceClient::DynamoDb(_) => ServiceName::DynamoDb,
        }
    }

    pub fn as_s3(&self) -> Option<&aws_sdk_s3::Client> {
        match self {
            ServiceClient::S3(client) => Some(client),
            _ => None,
        }
    }

    pub fn as_dynamodb(&self) -> Option<&aws_sdk_dynamodb::Client> {
        match self {
            ServiceClient::DynamoDb(client) => Some(client),
            _ => None,
        }
    }
}

/// A higher-level handle modelling buckets or tables.
#[derive(Debug, Clone)]
pub enum ServiceResource {
    S3(S3),
    DynamoDb(DynamoDb),
}

impl ServiceResource {
    pub fn service(&self) -> ServiceName {
        match self {
            ServiceResource::S3(_) => ServiceName::S3,
            ServiceResource::DynamoDb(_) => ServiceName::DynamoDb,
        }
    }

    pub fn as_s3(&self) -> Option<&S3> {
        match self {
            ServiceResource::S3(resource) => Some(resource),
            _ => None,
        }
    }

    pub fn as_dynamodb(&self) -> Option<&DynamoDb> {
        match self {
            ServiceResource::DynamoDb(resource) => Some(resource),
            _ => None,
        }
    }
}

impl ConnectionConfig {
    /// Returns the cached client for `service`, building it on first use.
    pub fn get_client(&self, service: ServiceName) -> Result<Arc<ServiceClient>> {
        self.clients
            .get_or_try_insert_with(service, || Ok(self.build_client(service)))
    }

    /// Returns the cached resource handle for `service`, building it on first use.
    ///
    /// Resource handles own a client of their own; this never touches the
    /// client cache.
    pub fn get_resource(&self, service: ServiceName) -> Result<Arc<ServiceResource>> {
        self.resources.get_or_try_insert_with(service, || {
            let resource = match self.build_client(service) {
                ServiceClient::S3(client) => ServiceResource::S3(S3::from_client(client)),
                ServiceClient::DynamoDb(client) => {
                    ServiceResource::DynamoDb(DynamoDb::from_client(client))
                }
            };
            Ok(resource)
        })
    }

    /// Typed shortcut for the cached S3 client.
    pub fn s3_client(&self) -> Result<aws_sdk_s3::Client> {
        let handle = self.get_client(ServiceName::S3)?;
        handle
            .as_s3()
            .cloned()
            .ok_or_else(|| Error::UnsupportedService(handle.service().to_string()))
    }

    /// Typed shortcut for the cached DynamoDB client.
    pub fn dynamodb_client(&self) -> Result<aws_sdk_dynamodb::Client> {
        let handle = self.get_client(ServiceName::DynamoDb)?;
        handle
            .as_dynamodb()
            .cloned()
            .ok_or_else(|| Error::UnsupportedService(handle.service().to_string()))
    }

    /// Typed shortcut for the cached S3 resource handle.
    pub fn s3(&self) -> Result<S3> {
        let handle = self.get_resource(ServiceName::S3)?;
        handle
            .as_s3()
            .cloned()
            .ok_or_else(|| Error::UnsupportedService(handle.service().to_string()))
    }

    /// Typed shortcut for the cached DynamoDB resource handle.
    pub fn dynamodb(&self) -> Result<DynamoDb> {
        let handle = self.get_resource(ServiceName::DynamoDb)?;
        handle
            .as_dynamodb()
            .cloned()
            .ok_or_else(|| Error::UnsupportedService(handle.service().to_string()))
    }

    fn build_client(&self, service: ServiceName) -> ServiceClient {
        debug!(
            service = %service,
            endpoint = self.endpoint_url(),
            region = self.region(),
            "Building client"
        );
        match service {
            ServiceName::S3 => ServiceClient::S3(self.build_s3_client()),
            ServiceName::DynamoDb => ServiceClient::DynamoDb(self.build_dynamodb_client()),
        }
    }

    fn build_s3_client(&self) -> aws_sdk_s3::Client {
        let config = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(self.region().to_string()))
            .credentials_provider(self.sdk_credentials())
            .endpoint_url(self.endpoint_url())
            .retry_config(self.retry_config())
            .timeout_config(self.timeout_config())
            .http_client(self.http_client())
            // The emulator serves every bucket from a single host.
            .force_path_style(true)
            .build();

        aws_sdk_s3::Client::from_conf(config)
    }

    fn build_dynamodb_client(&self) -> aws_sdk_dynamodb::Client {
        let config = aws_sdk_dynamodb::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(self.region().to_string()))
            .credentials_provider(self.sdk_credentials())
            .endpoint_url(self.endpoint_url())
            .retry_config(self.retry_config())
            .timeout_config(self.timeout_config())
            .http_client(self.http_client())
            .build();

        aws_sdk_dynamodb::Client::from_conf(config)
    }

    fn sdk_credentials(&self) -> Credentials {
        Credentials::new(
            self.credentials().access_key_id(),
            self.credentials().secret_access_key(),
            None,
            None,
            CREDENTIALS_PROVIDER,
        )
    }

    fn retry_config(&self) -> RetryConfig {
        RetryConfig::standard().with_max_attempts(self.policy().max_attempts)
    }

    fn timeout_config(&self) -> TimeoutConfig {
        TimeoutConfig::builder()
            .connect_timeout(self.policy().connect_timeout)
            .read_timeout(self.policy().read_timeout)
            .build()
    }

    fn http_client(&self) -> SharedHttpClient {
        let mut pool = hyper::Client::builder();
        pool.pool_max_idle_per_host(self.policy().max_pool_connections);
        HyperClientBuilder::new().hyper_builder(pool).build_https()
    }
}
