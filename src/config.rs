use std::fmt;
use std::time::Duration;

use url::Url;

use crate::cache::HandleCache;
use crate::clients::{ServiceClient, ServiceResource};
use crate::error::{Error, Result};

pub const REGION_VAR: &str = "AWS_DEFAULT_REGION";
pub const HOSTNAME_VAR: &str = "LOCALSTACK_HOSTNAME";
pub const ACCESS_KEY_ID_VAR: &str = "AWS_ACCESS_KEY_ID";
pub const SECRET_ACCESS_KEY_VAR: &str = "AWS_SECRET_ACCESS_KEY";

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_HOSTNAME: &str = "localhost";
pub const EMULATOR_PORT: u16 = 4566;
/// Placeholder accepted by the emulator; never valid against real AWS.
pub const PLACEHOLDER_CREDENTIAL: &str = "test";

/// Static credentials handed to every client built from a [`ConnectionConfig`].
#[derive(Clone, PartialEq, Eq)]
pub struct LocalCredentials {
    access_key_id: String,
    secret_access_key: String,
}

impl LocalCredentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }
}

impl Default for LocalCredentials {
    fn default() -> Self {
        Self::new(PLACEHOLDER_CREDENTIAL, PLACEHOLDER_CREDENTIAL)
    }
}

// Keep the secret out of logs.
impl fmt::Debug for LocalCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"**redacted**")
            .finish()
    }
}

/// Retry, timeout and connection pool settings applied to every client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientPolicy {
    pub max_attempts: u32,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    /// Idle connections kept per host by the HTTP client.
    pub max_pool_connections: usize,
}

impl Default for ClientPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(5),
            max_pool_connections: 10,
        }
    }
}

/// Connection parameters for the local emulator plus the handles built from them.
///
/// Region, endpoint and credentials are fixed at construction. The two
/// caches only ever grow: [`ConnectionConfig::get_client`] and
/// [`ConnectionConfig::get_resource`] each build a handle at most once per
/// service and hand out the same `Arc` afterwards.
#[derive(Debug)]
pub struct ConnectionConfig {
    region: String,
    endpoint_url: String,
    credentials: LocalCredentials,
    policy: ClientPolicy,
    pub(crate) clients: HandleCache<ServiceClient>,
    pub(crate) resources: HandleCache<ServiceResource>,
}

impl ConnectionConfig {
    /// Creates a config from explicit values, validating the endpoint.
    pub fn new(
        region: impl Into<String>,
        endpoint_url: impl Into<String>,
        credentials: LocalCredentials,
    ) -> Result<Self> {
        let endpoint_url = endpoint_url.into();
        validate_endpoint(&endpoint_url)?;

        Ok(Self {
            region: region.into(),
            endpoint_url,
            credentials,
            policy: ClientPolicy::default(),
            clients: HandleCache::new(),
            resources: HandleCache::new(),
        })
    }

    /// Resolves the config from the process environment.
    ///
    /// Environment variables:
    /// - `AWS_DEFAULT_REGION` - region (default: "us-east-1")
    /// - `LOCALSTACK_HOSTNAME` - emulator host, port is always 4566 (default: "localhost")
    /// - `AWS_ACCESS_KEY_ID` - access key id (default: "test")
    /// - `AWS_SECRET_ACCESS_KEY` - secret key (default: "test")
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ConnectionConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, fallback: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| fallback.to_string())
        };

        let region = var(REGION_VAR, DEFAULT_REGION);
        let endpoint_url = emulator_endpoint(&var(HOSTNAME_VAR, DEFAULT_HOSTNAME));
        let credentials = LocalCredentials::new(
            var(ACCESS_KEY_ID_VAR, PLACEHOLDER_CREDENTIAL),
            var(SECRET_ACCESS_KEY_VAR, PLACEHOLDER_CREDENTIAL),
        );

        Self::new(region, endpoint_url, credentials)
    }

    /// Returns a config with a different region and fresh, empty caches.
    pub fn with_region(self, region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            clients: HandleCache::new(),
            resources: HandleCache::new(),
            ..self
        }
    }

    /// Returns a config with a different endpoint and fresh, empty caches.
    pub fn with_endpoint_url(self, endpoint_url: impl Into<String>) -> Result<Self> {
        let endpoint_url = endpoint_url.into();
        validate_endpoint(&endpoint_url)?;

        Ok(Self {
            endpoint_url,
            clients: HandleCache::new(),
            resources: HandleCache::new(),
            ..self
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    pub fn credentials(&self) -> &LocalCredentials {
        &self.credentials
    }

    pub fn policy(&self) -> &ClientPolicy {
        &self.policy
    }

    /// Returns a display string for the target environment.
    pub fn target_display(&self) -> String {
        format!("{} (region: {})", self.endpoint_url, self.region)
    }
}

/// Builds the emulator endpoint for `host`.
pub fn emulator_endpoint(host: &str) -> String {
    format!("http://{host}:{EMULATOR_PORT}")
}

fn validate_endpoint(endpoint_url: &str) -> Result<()> {
    let invalid = |reason: String| Error::InvalidEndpoint {
        url: endpoint_url.to_string(),
        reason,
    };

    let parsed = Url::parse(endpoint_url).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(invalid(format!("unsupported scheme '{scheme}'"))),
    }
    if parsed.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(())
}
