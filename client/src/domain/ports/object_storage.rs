//! Port for binary asset storage behind signed URLs.
//!
//! Uploads land under an object key chosen by the caller; downloads go
//! through short-lived signed URLs so the bucket itself stays private.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use super::define_port_error;

define_port_error! {
    /// Errors raised by object storage adapters.
    pub enum ObjectStorageError {
        /// The object key was rejected before reaching the store.
        InvalidKey { message: String } => "invalid object key: {message}",
        /// The store could not be reached.
        Transport { message: String } => "object storage unreachable: {message}",
        /// The store answered with a non-success status.
        Rejected { status: u16, message: String } =>
            "object storage rejected the request ({status}): {message}",
        /// No object exists under the key.
        NotFound { key: String } => "object not found: {key}",
        /// A signed URL could not be produced.
        Signing { message: String } => "failed to sign object URL: {message}",
    }
}

/// Path of an object inside the bucket, e.g. `zips/1700000000000-oak.zip`.
///
/// Keys are relative: no leading `/`, no empty segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Validate and construct a key.
    pub fn new(raw: impl Into<String>) -> Result<Self, ObjectStorageError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(ObjectStorageError::invalid_key("key must not be empty"));
        }
        if raw.starts_with('/') || raw.split('/').any(str::is_empty) {
            return Err(ObjectStorageError::invalid_key(format!(
                "key `{raw}` must be relative without empty segments"
            )));
        }
        Ok(Self(raw))
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ObjectKey {
    type Error = ObjectStorageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ObjectKey> for String {
    fn from(value: ObjectKey) -> Self {
        value.0
    }
}

/// Bytes to store under `key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectUpload {
    /// Destination key.
    pub key: ObjectKey,
    /// MIME type recorded with the object.
    pub content_type: String,
    /// Object body.
    pub bytes: Vec<u8>,
}

/// Temporary download URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUrl {
    /// URL granting read access.
    pub url: Url,
    /// Instant after which the URL stops working.
    pub expires_at: DateTime<Utc>,
}

/// Object store with signed downloads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `upload`, replacing any object already under its key.
    async fn upload(&self, upload: &ObjectUpload) -> Result<ObjectKey, ObjectStorageError>;

    /// Produce a URL granting read access to `key` for `expires_in`.
    async fn sign(
        &self,
        key: &ObjectKey,
        expires_in: Duration,
    ) -> Result<SignedUrl, ObjectStorageError>;
}
