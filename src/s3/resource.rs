use aws_sdk_s3::{
    error::SdkError,
    operation::create_bucket::CreateBucketError,
    types::{
        BucketVersioningStatus, CorsConfiguration, CorsRule, PublicAccessBlockConfiguration,
        ServerSideEncryption, ServerSideEncryptionByDefault, ServerSideEncryptionConfiguration,
        ServerSideEncryptionRule, VersioningConfiguration,
    },
    Client,
};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::provision::CreateOutcome;
use crate::s3::bucket::{self, BucketDefinition, BucketEncryption, CorsRuleDefinition};

/// S3 resource handle for bucket-level operations.
///
/// Wraps an SDK client and exposes the handful of bucket operations the
/// provisioning flows need. Every method talks to the endpoint the client
/// was built for; nothing is cached here.
///
/// # Buckets
///
/// Bucket names are global per endpoint. Creating a bucket outside
/// `us-east-1` requires a location constraint matching the client region,
/// which [`S3::create_bucket`] adds on its own.
///
/// # Example
///
/// ```no_run
/// use aws_local_dev::{ConnectionConfig, ServiceName};
///
/// # async fn example() -> aws_local_dev::Result<()> {
/// let config = ConnectionConfig::from_env()?;
/// let s3 = config.s3()?;
///
/// s3.create_bucket("my-application-storage", config.region()).await?;
/// s3.enable_versioning("my-application-storage").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct S3 {
    client: Client,
}

impl S3 {
    /// Wraps an already configured client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// The underlying SDK client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    // --- Bucket Operations ---

    /// Creates `name` in `region`, reporting an existing bucket as [`CreateOutcome::AlreadyExists`].
    pub async fn create_bucket(&self, name: &str, region: &str) -> Result<CreateOutcome> {
        if self.bucket_exists(name).await? {
            info!("Bucket '{name}' already exists");
            return Ok(CreateOutcome::AlreadyExists);
        }

        let result = self
            .client
            .create_bucket()
            .bucket(name)
            .set_create_bucket_configuration(bucket::create_bucket_configuration(region))
            .send()
            .await;

        match result {
            Ok(_) => {
                info!("Bucket '{name}' created");
                Ok(CreateOutcome::Created)
            }
            Err(err) if is_already_exists(&err) => {
                info!("Bucket '{name}' already exists");
                Ok(CreateOutcome::AlreadyExists)
            }
            Err(err) => Err(Error::s3(err)),
        }
    }

    /// Checks if a bucket exists.
    pub async fn bucket_exists(&self, name: &str) -> Result<bool> {
        match self.client.head_bucket().bucket(name).send().await {
            Ok(_) => Ok(true),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|service_err| service_err.is_not_found()) =>
            {
                Ok(false)
            }
            Err(err) => Err(Error::s3(err)),
        }
    }

    /// Lists the names of all buckets on the endpoint.
    pub async fn list_buckets(&self) -> Result<Vec<String>> {
        let output = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(Error::s3)?;

        Ok(output
            .buckets()
            .iter()
            .filter_map(|b| b.name())
            .map(str::to_string)
            .collect())
    }

    /// Deletes an (empty) bucket.
    pub async fn delete_bucket(&self, name: &str) -> Result<()> {
        self.client
            .delete_bucket()
            .bucket(name)
            .send()
            .await
            .map_err(Error::s3)?;
        info!("Bucket '{name}' deleted");
        Ok(())
    }

    // --- Bucket Settings ---

    pub async fn enable_versioning(&self, name: &str) -> Result<()> {
        self.client
            .put_bucket_versioning()
            .bucket(name)
            .versioning_configuration(
                VersioningConfiguration::builder()
                    .status(BucketVersioningStatus::Enabled)
                    .build(),
            )
            .send()
            .await
            .map_err(Error::s3)?;
        debug!("Versioning enabled on '{name}'");
        Ok(())
    }

    /// Returns the versioning status, `None` if versioning was never configured.
    pub async fn versioning_status(&self, name: &str) -> Result<Option<BucketVersioningStatus>> {
        let output = self
            .client
            .get_bucket_versioning()
            .bucket(name)
            .send()
            .await
            .map_err(Error::s3)?;
        Ok(output.status().cloned())
    }

    /// Applies SSE-S3 (AES256) as the bucket's default encryption.
    pub async fn enable_default_encryption(&self, name: &str) -> Result<()> {
        let by_default = ServerSideEncryptionByDefault::builder()
            .sse_algorithm(ServerSideEncryption::Aes256)
            .build()
            .map_err(Error::s3)?;
        let configuration = ServerSideEncryptionConfiguration::builder()
            .rules(
                ServerSideEncryptionRule::builder()
                    .apply_server_side_encryption_by_default(by_default)
                    .build(),
            )
            .build()
            .map_err(Error::s3)?;

        self.client
            .put_bucket_encryption()
            .bucket(name)
            .server_side_encryption_configuration(configuration)
            .send()
            .await
            .map_err(Error::s3)?;
        debug!("Default encryption enabled on '{name}'");
        Ok(())
    }

    pub async fn block_public_access(&self, name: &str) -> Result<()> {
        self.client
            .put_public_access_block()
            .bucket(name)
            .public_access_block_configuration(
                PublicAccessBlockConfiguration::builder()
                    .block_public_acls(true)
                    .ignore_public_acls(true)
                    .block_public_policy(true)
                    .restrict_public_buckets(true)
                    .build(),
            )
            .send()
            .await
            .map_err(Error::s3)?;
        debug!("Public access blocked on '{name}'");
        Ok(())
    }

    /// Installs a bucket policy rejecting plain-HTTP requests.
    pub async fn enforce_ssl(&self, name: &str) -> Result<()> {
        self.client
            .put_bucket_policy()
            .bucket(name)
            .policy(bucket::ssl_only_policy(name).to_string())
            .send()
            .await
            .map_err(Error::s3)?;
        debug!("SSL-only policy installed on '{name}'");
        Ok(())
    }

    pub async fn put_cors_rules(&self, name: &str, rules: &[CorsRuleDefinition<'_>]) -> Result<()> {
        let cors_rules = rules
            .iter()
            .map(to_cors_rule)
            .collect::<Result<Vec<_>>>()?;

        self.client
            .put_bucket_cors()
            .bucket(name)
            .cors_configuration(
                CorsConfiguration::builder()
                    .set_cors_rules(Some(cors_rules))
                    .build()
                    .map_err(Error::s3)?,
            )
            .send()
            .await
            .map_err(Error::s3)?;
        debug!("{} CORS rule(s) installed on '{name}'", rules.len());
        Ok(())
    }

    /// Creates the bucket described by `definition` and applies its settings.
    ///
    /// Settings are re-applied when the bucket already exists, so running
    /// this twice converges on the same configuration.
    pub async fn apply(&self, definition: &BucketDefinition<'_>, region: &str) -> Result<CreateOutcome> {
        let name = definition.name();
        let outcome = self.create_bucket(name, region).await?;

        if definition.is_versioned() {
            self.enable_versioning(name).await?;
        }
        if definition.encryption() == BucketEncryption::S3Managed {
            self.enable_default_encryption(name).await?;
        }
        if definition.public_access_blocked() {
            self.block_public_access(name).await?;
        }
        if definition.ssl_enforced() {
            self.enforce_ssl(name).await?;
        }
        if !definition.cors_rules().is_empty() {
            self.put_cors_rules(name, definition.cors_rules()).await?;
        }

        Ok(outcome)
    }
}

fn is_already_exists<R>(err: &SdkError<CreateBucketError, R>) -> bool {
    err.as_service_error().is_some_and(|service_err| {
        service_err.is_bucket_already_exists() || service_err.is_bucket_already_owned_by_you()
    })
}

fn to_cors_rule(rule: &CorsRuleDefinition<'_>) -> Result<CorsRule> {
    let owned = |values: &[&str]| values.iter().map(|v| v.to_string()).collect::<Vec<_>>();

    CorsRule::builder()
        .set_allowed_methods(Some(owned(&rule.allowed_methods)))
        .set_allowed_origins(Some(owned(&rule.allowed_origins)))
        .set_allowed_headers(Some(owned(&rule.allowed_headers)))
        .max_age_seconds(rule.max_age_seconds)
        .build()
        .map_err(Error::s3)
}
