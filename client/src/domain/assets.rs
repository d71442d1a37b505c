//! Asset uploads and signed downloads.
//!
//! Keys are `{folder}/{unix_millis}-{file_name}` so repeated uploads of the
//! same file never overwrite each other.

use std::sync::Arc;
use std::time::Duration;

use mockable::Clock;
use tracing::info;

use super::Error;
use super::ports::{ObjectKey, ObjectStorage, ObjectStorageError, ObjectUpload, SignedUrl};

/// Folder used when the caller does not name one.
pub const DEFAULT_FOLDER: &str = "zips";
/// Lifetime of signed download URLs unless configured otherwise.
pub const DEFAULT_SIGNED_URL_TTL: Duration = Duration::from_secs(3600);

fn map_storage_error(error: ObjectStorageError) -> Error {
    match error {
        ObjectStorageError::InvalidKey { message } => Error::invalid_request(message),
        ObjectStorageError::NotFound { key } => Error::not_found(format!("asset {key} not found")),
        ObjectStorageError::Transport { message } => {
            Error::service_unavailable(format!("object storage unavailable: {message}"))
        }
        ObjectStorageError::Rejected { status, message } => {
            Error::service_unavailable(format!("object storage rejected the request ({status}): {message}"))
        }
        ObjectStorageError::Signing { message } => {
            Error::internal(format!("failed to sign download URL: {message}"))
        }
    }
}

/// A file to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFile {
    /// Original file name, e.g. `oak.zip`.
    pub name: String,
    /// MIME type.
    pub content_type: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

/// Upload and download-link use-cases.
#[derive(Clone)]
pub struct AssetService {
    storage: Arc<dyn ObjectStorage>,
    clock: Arc<dyn Clock>,
    signed_url_ttl: Duration,
}

impl AssetService {
    /// Create the service with the default one-hour link lifetime.
    pub fn new(storage: Arc<dyn ObjectStorage>, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            clock,
            signed_url_ttl: DEFAULT_SIGNED_URL_TTL,
        }
    }

    /// Override the signed URL lifetime.
    #[must_use]
    pub fn with_signed_url_ttl(mut self, ttl: Duration) -> Self {
        self.signed_url_ttl = ttl;
        self
    }

    /// Key an upload of `file_name` into `folder` would use right now.
    pub fn object_key(&self, folder: Option<&str>, file_name: &str) -> Result<ObjectKey, Error> {
        let file_name = file_name.trim();
        if file_name.is_empty() || file_name.contains('/') {
            return Err(Error::invalid_request(
                "file name must be non-empty and must not contain `/`",
            ));
        }
        let folder = folder
            .map(|folder| folder.trim().trim_matches('/'))
            .filter(|folder| !folder.is_empty())
            .unwrap_or(DEFAULT_FOLDER);
        let millis = self.clock.utc().timestamp_millis();
        ObjectKey::new(format!("{folder}/{millis}-{file_name}")).map_err(map_storage_error)
    }

    /// Upload `file` under `folder` (default [`DEFAULT_FOLDER`]) and return
    /// its key.
    pub async fn upload(&self, file: AssetFile, folder: Option<&str>) -> Result<ObjectKey, Error> {
        let key = self.object_key(folder, &file.name)?;
        let size = file.bytes.len();
        let upload = ObjectUpload {
            key,
            content_type: file.content_type,
            bytes: file.bytes,
        };
        let stored = self
            .storage
            .upload(&upload)
            .await
            .map_err(map_storage_error)?;
        info!(key = %stored, size, "asset uploaded");
        Ok(stored)
    }

    /// Signed download link for `key`.
    pub async fn download_link(&self, key: &ObjectKey) -> Result<SignedUrl, Error> {
        self.storage
            .sign(key, self.signed_url_ttl)
            .await
            .map_err(map_storage_error)
    }
}
