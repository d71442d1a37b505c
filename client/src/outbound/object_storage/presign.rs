//! AWS Signature Version 4 query-string presigning.
//!
//! Produces URLs that grant time-limited access to one object without
//! sharing credentials. Works against AWS S3 and S3-compatible stores such
//! as Cloudflare R2 (region `auto`). Only the `host` header is signed and
//! the payload is `UNSIGNED-PAYLOAD`, so any client can replay the URL.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use url::Url;
use zeroize::Zeroizing;

use crate::domain::ports::{ObjectKey, ObjectStorageError};

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "s3";
const SCOPE_TERMINATOR: &str = "aws4_request";
const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";
const SIGNED_HEADERS: &str = "host";
const MAX_EXPIRY_SECS: u64 = 7 * 24 * 60 * 60;

/// Default region for S3-compatible stores that ignore regions.
pub const AUTO_REGION: &str = "auto";

/// HTTP method a presigned URL is valid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresignMethod {
    /// Download.
    Get,
    /// Upload.
    Put,
}

impl PresignMethod {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
        }
    }
}

/// How the bucket is addressed in the URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AddressingStyle {
    /// `https://endpoint/bucket/key`.
    #[default]
    Path,
    /// `https://bucket.endpoint/key`.
    VirtualHosted,
}

/// Access key pair.
#[derive(Clone)]
pub struct S3Credentials {
    access_key_id: String,
    secret_access_key: Zeroizing<String>,
}

impl S3Credentials {
    /// Wrap an access key id and secret.
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: Zeroizing::new(secret_access_key.into()),
        }
    }
}

impl fmt::Debug for S3Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

/// Signs object URLs for one bucket.
#[derive(Debug, Clone)]
pub struct Presigner {
    endpoint: Url,
    bucket: String,
    region: String,
    credentials: S3Credentials,
    style: AddressingStyle,
}

impl Presigner {
    /// Build a path-style presigner for `bucket` at `endpoint`.
    pub fn new(
        endpoint: Url,
        bucket: impl Into<String>,
        region: impl Into<String>,
        credentials: S3Credentials,
    ) -> Self {
        Self {
            endpoint,
            bucket: bucket.into(),
            region: region.into(),
            credentials,
            style: AddressingStyle::Path,
        }
    }

    /// Switch the addressing style.
    #[must_use]
    pub fn with_style(mut self, style: AddressingStyle) -> Self {
        self.style = style;
        self
    }

    /// Presign `method` on `key`, valid from `now` for `expires_in`.
    pub fn presign(
        &self,
        method: PresignMethod,
        key: &ObjectKey,
        now: DateTime<Utc>,
        expires_in: Duration,
    ) -> Result<Url, ObjectStorageError> {
        let expires = expires_in.as_secs();
        if expires == 0 || expires > MAX_EXPIRY_SECS {
            return Err(ObjectStorageError::signing(format!(
                "expiry must be between 1 and {MAX_EXPIRY_SECS} seconds, got {expires}"
            )));
        }

        let scheme = self.endpoint.scheme();
        let endpoint_host = self
            .endpoint
            .host_str()
            .ok_or_else(|| ObjectStorageError::signing("storage endpoint has no host"))?;
        let port = self
            .endpoint
            .port()
            .map(|port| format!(":{port}"))
            .unwrap_or_default();
        let (host, canonical_uri) = match self.style {
            AddressingStyle::Path => (
                format!("{endpoint_host}{port}"),
                format!("/{}/{}", uri_encode(&self.bucket), encode_key(key)),
            ),
            AddressingStyle::VirtualHosted => (
                format!("{}.{endpoint_host}{port}", self.bucket),
                format!("/{}", encode_key(key)),
            ),
        };

        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();
        let scope = format!("{date}/{}/{SERVICE}/{SCOPE_TERMINATOR}", self.region);
        let credential = format!("{}/{scope}", self.credentials.access_key_id);

        let mut params = vec![
            ("X-Amz-Algorithm", ALGORITHM.to_owned()),
            ("X-Amz-Credential", credential),
            ("X-Amz-Date", amz_date.clone()),
            ("X-Amz-Expires", expires.to_string()),
            ("X-Amz-SignedHeaders", SIGNED_HEADERS.to_owned()),
        ];
        params.sort_by(|left, right| left.0.cmp(right.0));
        let canonical_query = params
            .iter()
            .map(|(name, value)| format!("{}={}", uri_encode(name), uri_encode(value)))
            .collect::<Vec<_>>()
            .join("&");

        let canonical_request = format!(
            "{method}\n{canonical_uri}\n{canonical_query}\nhost:{host}\n\n{SIGNED_HEADERS}\n{UNSIGNED_PAYLOAD}",
            method = method.as_str(),
        );
        let string_to_sign = format!(
            "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let signing_key = self.signing_key(&date)?;
        let signature = hex::encode(hmac(&signing_key, string_to_sign.as_bytes())?);

        Url::parse(&format!(
            "{scheme}://{host}{canonical_uri}?{canonical_query}&X-Amz-Signature={signature}"
        ))
        .map_err(|err| ObjectStorageError::signing(err.to_string()))
    }

    fn signing_key(&self, date: &str) -> Result<Vec<u8>, ObjectStorageError> {
        let secret = Zeroizing::new(format!("AWS4{}", self.credentials.secret_access_key.as_str()));
        let date_key = hmac(secret.as_bytes(), date.as_bytes())?;
        let region_key = hmac(&date_key, self.region.as_bytes())?;
        let service_key = hmac(&region_key, SERVICE.as_bytes())?;
        hmac(&service_key, SCOPE_TERMINATOR.as_bytes())
    }
}

fn hmac(key: &[u8], data: &[u8]) -> Result<Vec<u8>, ObjectStorageError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .map_err(|err| ObjectStorageError::signing(err.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn encode_key(key: &ObjectKey) -> String {
    key.as_ref()
        .split('/')
        .map(uri_encode)
        .collect::<Vec<_>>()
        .join("/")
}

/// RFC 3986 encoding as SigV4 requires: only unreserved bytes pass through.
fn uri_encode(raw: &str) -> String {
    let mut encoded = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(char::from(byte));
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}
