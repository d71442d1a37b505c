//! In-process object storage for local runs and tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockable::Clock;
use parking_lot::RwLock;
use url::Url;

use crate::domain::ports::{ObjectKey, ObjectStorage, ObjectStorageError, ObjectUpload, SignedUrl};

#[derive(Debug, Clone)]
struct StoredObject {
    content_type: String,
    bytes: Vec<u8>,
}

/// Objects kept in a map; signed URLs use the `memory://` scheme.
pub struct MemoryObjectStorage {
    bucket: String,
    clock: Arc<dyn Clock>,
    objects: RwLock<HashMap<ObjectKey, StoredObject>>,
}

impl MemoryObjectStorage {
    /// Empty store for `bucket`.
    pub fn new(bucket: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            bucket: bucket.into(),
            clock,
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Content type and bytes stored under `key`.
    pub fn object(&self, key: &ObjectKey) -> Option<(String, Vec<u8>)> {
        self.objects
            .read()
            .get(key)
            .map(|object| (object.content_type.clone(), object.bytes.clone()))
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    /// True when nothing has been uploaded.
    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjectStorage {
    async fn upload(&self, upload: &ObjectUpload) -> Result<ObjectKey, ObjectStorageError> {
        self.objects.write().insert(
            upload.key.clone(),
            StoredObject {
                content_type: upload.content_type.clone(),
                bytes: upload.bytes.clone(),
            },
        );
        Ok(upload.key.clone())
    }

    async fn sign(
        &self,
        key: &ObjectKey,
        expires_in: Duration,
    ) -> Result<SignedUrl, ObjectStorageError> {
        if !self.objects.read().contains_key(key) {
            return Err(ObjectStorageError::not_found(key.to_string()));
        }
        let lifetime = chrono::Duration::from_std(expires_in)
            .map_err(|err| ObjectStorageError::signing(err.to_string()))?;
        let expires_at = self.clock.utc() + lifetime;
        let mut url = Url::parse(&format!("memory://{}/", self.bucket))
            .map_err(|err| ObjectStorageError::signing(err.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| ObjectStorageError::signing("memory URL cannot hold a path"))?
            .pop_if_empty()
            .extend(key.as_ref().split('/'));
        url.query_pairs_mut()
            .append_pair("expires", &expires_at.timestamp().to_string());
        Ok(SignedUrl { url, expires_at })
    }
}
