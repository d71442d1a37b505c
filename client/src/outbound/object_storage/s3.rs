//! S3-compatible object storage over presigned URLs.
//!
//! Uploads are a single `PUT` to a short-lived presigned URL; downloads hand
//! out presigned `GET` URLs without contacting the store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockable::Clock;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use tracing::debug;

use super::presign::{PresignMethod, Presigner};
use crate::domain::ports::{ObjectKey, ObjectStorage, ObjectStorageError, ObjectUpload, SignedUrl};

/// Lifetime of the URL used for a single upload.
const UPLOAD_URL_TTL: Duration = Duration::from_secs(15 * 60);
const MAX_ERROR_BODY: usize = 256;

/// Bucket client for AWS S3, Cloudflare R2 and compatible stores.
#[derive(Clone)]
pub struct S3ObjectStorage {
    client: Client,
    presigner: Presigner,
    clock: Arc<dyn Clock>,
}

impl S3ObjectStorage {
    /// Build a client that signs with `presigner` and reads time from `clock`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        presigner: Presigner,
        clock: Arc<dyn Clock>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            presigner,
            clock,
        })
    }
}

fn map_status(status: StatusCode, key: &ObjectKey, body: &str) -> ObjectStorageError {
    if status == StatusCode::NOT_FOUND && body.contains("NoSuchKey") {
        return ObjectStorageError::not_found(key.to_string());
    }
    let message: String = body.trim().chars().take(MAX_ERROR_BODY).collect();
    let message = if message.is_empty() {
        status.canonical_reason().unwrap_or("no body").to_owned()
    } else {
        message
    };
    ObjectStorageError::rejected(status.as_u16(), message)
}

#[async_trait]
impl ObjectStorage for S3ObjectStorage {
    async fn upload(&self, upload: &ObjectUpload) -> Result<ObjectKey, ObjectStorageError> {
        let url = self.presigner.presign(
            PresignMethod::Put,
            &upload.key,
            self.clock.utc(),
            UPLOAD_URL_TTL,
        )?;
        debug!(key = %upload.key, size = upload.bytes.len(), "uploading object");
        let response = self
            .client
            .put(url)
            .header(CONTENT_TYPE, upload.content_type.as_str())
            .body(upload.bytes.clone())
            .send()
            .await
            .map_err(|err| ObjectStorageError::transport(err.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(upload.key.clone());
        }
        let body = response
            .text()
            .await
            .map_err(|err| ObjectStorageError::transport(err.to_string()))?;
        Err(map_status(status, &upload.key, &body))
    }

    async fn sign(
        &self,
        key: &ObjectKey,
        expires_in: Duration,
    ) -> Result<SignedUrl, ObjectStorageError> {
        let now = self.clock.utc();
        let lifetime = chrono::Duration::from_std(expires_in)
            .map_err(|err| ObjectStorageError::signing(err.to_string()))?;
        let url = self
            .presigner
            .presign(PresignMethod::Get, key, now, expires_in)?;
        Ok(SignedUrl {
            url,
            expires_at: now + lifetime,
        })
    }
}
