use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use serde_json::{json, Value};

/// The region S3 treats as the default; it must not be sent as a location constraint.
pub const DEFAULT_BUCKET_REGION: &str = "us-east-1";

/// Server-side encryption applied to new objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketEncryption {
    Unencrypted,
    /// SSE-S3 (AES256) with keys managed by S3.
    S3Managed,
}

/// A single CORS rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsRuleDefinition<'a> {
    pub allowed_methods: Vec<&'a str>,
    pub allowed_origins: Vec<&'a str>,
    pub allowed_headers: Vec<&'a str>,
    pub max_age_seconds: i32,
}

/// S3 bucket configuration.
///
/// Describes the bucket together with the settings applied right after it
/// is created. `BucketDefinition::new` gives a bare bucket; the `with_*`
/// methods layer on versioning, encryption and access controls.
///
/// # Example
///
/// ```
/// use aws_local_dev::s3::{BucketDefinition, BucketEncryption};
///
/// let bucket = BucketDefinition::new("my-application-storage")
///     .versioned()
///     .with_encryption(BucketEncryption::S3Managed)
///     .enforce_ssl()
///     .block_public_access();
///
/// assert!(bucket.is_versioned());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketDefinition<'a> {
    name: &'a str,
    versioned: bool,
    encryption: BucketEncryption,
    enforce_ssl: bool,
    block_public_access: bool,
    cors_rules: Vec<CorsRuleDefinition<'a>>,
}

impl<'a> BucketDefinition<'a> {
    pub fn new(name: &'a str) -> Self {
        Self {
            name,
            versioned: false,
            encryption: BucketEncryption::Unencrypted,
            enforce_ssl: false,
            block_public_access: false,
            cors_rules: Vec::new(),
        }
    }

    pub fn versioned(mut self) -> Self {
        self.versioned = true;
        self
    }

    pub fn with_encryption(mut self, encryption: BucketEncryption) -> Self {
        self.encryption = encryption;
        self
    }

    /// Denies any request that does not arrive over TLS.
    pub fn enforce_ssl(mut self) -> Self {
        self.enforce_ssl = true;
        self
    }

    pub fn block_public_access(mut self) -> Self {
        self.block_public_access = true;
        self
    }

    pub fn with_cors_rule(mut self, rule: CorsRuleDefinition<'a>) -> Self {
        self.cors_rules.push(rule);
        self
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn is_versioned(&self) -> bool {
        self.versioned
    }

    pub fn encryption(&self) -> BucketEncryption {
        self.encryption
    }

    pub fn ssl_enforced(&self) -> bool {
        self.enforce_ssl
    }

    pub fn public_access_blocked(&self) -> bool {
        self.block_public_access
    }

    pub fn cors_rules(&self) -> &[CorsRuleDefinition<'a>] {
        &self.cors_rules
    }
}

/// Location constraint to send with `CreateBucket` for `region`.
///
/// S3 rejects an explicit `us-east-1` constraint, so that region gets none.
pub fn location_constraint(region: &str) -> Option<BucketLocationConstraint> {
    if region == DEFAULT_BUCKET_REGION {
        None
    } else {
        Some(BucketLocationConstraint::from(region))
    }
}

/// `CreateBucketConfiguration` for `region`, if one is needed.
pub fn create_bucket_configuration(region: &str) -> Option<CreateBucketConfiguration> {
    location_constraint(region).map(|constraint| {
        CreateBucketConfiguration::builder()
            .location_constraint(constraint)
            .build()
    })
}

/// Bucket policy that denies every action on `bucket` made without TLS.
pub fn ssl_only_policy(bucket: &str) -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Effect": "Deny",
            "Principal": { "AWS": "*" },
            "Action": "s3:*",
            "Resource": [
                format!("arn:aws:s3:::{bucket}"),
                format!("arn:aws:s3:::{bucket}/*"),
            ],
            "Condition": { "Bool": { "aws:SecureTransport": "false" } },
        }],
    })
}
