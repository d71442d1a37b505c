//! Client configuration loaded via OrthoConfig.
//!
//! Every field can be set through `MARKET_*` environment variables or a
//! configuration file. Optional collaborators fall back to in-process
//! fixtures when their settings are absent.

use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::DEFAULT_SIGNED_URL_TTL;
use crate::outbound::object_storage::AUTO_REGION;
use crate::outbound::payment::DEFAULT_PAYMENT_DELAY;

const DEFAULT_SESSION_DIR: &str = ".market-session";
const DEFAULT_BUCKET: &str = "materials";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration errors surfaced while interpreting loaded settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// A URL setting did not parse.
    #[error("{field} is not a valid URL: {message}")]
    InvalidUrl {
        /// Offending setting.
        field: &'static str,
        /// Parser message.
        message: String,
    },
}

/// Connection details for an S3-compatible bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSettings {
    /// Service endpoint, without the bucket.
    pub endpoint: Url,
    /// Bucket name.
    pub bucket: String,
    /// Access key id.
    pub access_key: String,
    /// Secret access key.
    pub secret_key: String,
    /// Signing region.
    pub region: String,
}

/// Settings controlling which collaborators the client talks to.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "MARKET")]
pub struct ClientSettings {
    /// Base URL of the identity provider and profile REST gateway.
    pub identity_url: Option<String>,
    /// Publishable API key sent with every identity request.
    pub api_key: Option<String>,
    /// Object storage endpoint.
    pub storage_endpoint: Option<String>,
    /// Object storage bucket.
    pub storage_bucket: Option<String>,
    /// Object storage access key id.
    pub storage_access_key: Option<String>,
    /// Object storage secret access key.
    pub storage_secret_key: Option<String>,
    /// Object storage signing region.
    pub storage_region: Option<String>,
    /// Directory holding the persisted session slots.
    pub session_dir: Option<PathBuf>,
    /// Lifetime of signed download URLs, in seconds.
    pub signed_url_ttl_secs: Option<u64>,
    /// Simulated payment latency, in milliseconds.
    pub payment_delay_ms: Option<u64>,
    /// Timeout applied to outbound HTTP requests, in seconds.
    pub http_timeout_secs: Option<u64>,
}

impl ClientSettings {
    /// Identity service base URL with its API key, if both are configured.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidUrl`] when the URL does not parse.
    pub fn identity(&self) -> Result<Option<(Url, String)>, SettingsError> {
        let (Some(raw), Some(api_key)) = (self.identity_url.as_deref(), self.api_key.as_deref())
        else {
            return Ok(None);
        };
        let url = parse_url("identity_url", raw)?;
        Ok(Some((url, api_key.to_owned())))
    }

    /// Bucket connection details, if endpoint and credentials are configured.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidUrl`] when the endpoint does not parse.
    pub fn storage(&self) -> Result<Option<StorageSettings>, SettingsError> {
        let (Some(endpoint), Some(access_key), Some(secret_key)) = (
            self.storage_endpoint.as_deref(),
            self.storage_access_key.as_deref(),
            self.storage_secret_key.as_deref(),
        ) else {
            return Ok(None);
        };
        Ok(Some(StorageSettings {
            endpoint: parse_url("storage_endpoint", endpoint)?,
            bucket: self.storage_bucket(),
            access_key: access_key.to_owned(),
            secret_key: secret_key.to_owned(),
            region: self
                .storage_region
                .clone()
                .unwrap_or_else(|| AUTO_REGION.to_owned()),
        }))
    }

    /// Configured bucket name, falling back to the default.
    pub fn storage_bucket(&self) -> String {
        self.storage_bucket
            .clone()
            .unwrap_or_else(|| DEFAULT_BUCKET.to_owned())
    }

    /// Configured session directory, falling back to the default.
    pub fn session_dir(&self) -> PathBuf {
        self.session_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_DIR))
    }

    /// Lifetime of signed download URLs.
    pub fn signed_url_ttl(&self) -> Duration {
        self.signed_url_ttl_secs
            .map_or(DEFAULT_SIGNED_URL_TTL, Duration::from_secs)
    }

    /// Simulated payment latency.
    pub fn payment_delay(&self) -> Duration {
        self.payment_delay_ms
            .map_or(DEFAULT_PAYMENT_DELAY, Duration::from_millis)
    }

    /// Timeout for outbound HTTP requests.
    pub fn http_timeout(&self) -> Duration {
        self.http_timeout_secs
            .map_or(DEFAULT_HTTP_TIMEOUT, Duration::from_secs)
    }
}

fn parse_url(field: &'static str, raw: &str) -> Result<Url, SettingsError> {
    Url::parse(raw).map_err(|err| SettingsError::InvalidUrl {
        field,
        message: err.to_string(),
    })
}
