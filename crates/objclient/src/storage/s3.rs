//! S3-compatible storage backend.

use base64::Engine;
use object_store::aws::AmazonS3Builder;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use super::adapter::{BackendKind, StoreClient};
use super::config::{endpoint_url, flag};
use crate::config::{parse_bool, ClientSettings};
use crate::{Error, Result};

/// Region assumed when signature v4 is selected without one.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Length in bytes of an SSE-C customer key.
pub const SSEC_KEY_LEN: usize = 32;

/// Raw S3 configuration as supplied by the caller.
///
/// Toggles are strings: `https` is on unless literally `"false"`;
/// `path_style_request` and `v4_signature` are off unless literally `"true"`.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct S3Config {
    /// Endpoint host (or URL). Defaults to the AWS endpoint for `region`.
    pub endpoint: String,
    /// Region name
    pub region: String,
    /// Use HTTPS (default on)
    #[serde(deserialize_with = "flag")]
    pub https: String,
    /// Bucket name
    pub bucket: String,
    /// Address the bucket in the path instead of the host name (default off)
    #[serde(deserialize_with = "flag")]
    pub path_style_request: String,
    /// Access key ID
    pub key_id: String,
    /// Secret access key
    pub key: String,
    /// Sign requests with signature v4 (default off)
    #[serde(deserialize_with = "flag")]
    pub v4_signature: String,
    /// 32-byte SSE-C customer key; empty disables SSE-C
    pub ssec_key: String,
}

impl std::fmt::Debug for S3Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Config")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("https", &self.https)
            .field("bucket", &self.bucket)
            .field("path_style_request", &self.path_style_request)
            .field("key_id", &self.key_id)
            .field("key", &"<redacted>")
            .field("v4_signature", &self.v4_signature)
            .field("ssec_key", &(!self.ssec_key.is_empty()).then_some("<redacted>"))
            .finish()
    }
}

/// Request signing scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureVersion {
    /// Legacy signature v2
    V2,
    /// Signature v4
    V4,
}

/// SSE-C customer key, validated to be exactly 32 bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct SseCustomerKey([u8; SSEC_KEY_LEN]);

impl SseCustomerKey {
    /// Validate and wrap a raw key.
    pub fn new(raw: &[u8]) -> Result<Self> {
        let key: [u8; SSEC_KEY_LEN] = raw.try_into().map_err(|_| {
            Error::InvalidArgument(format!(
                "length of SSE-C key must be {SSEC_KEY_LEN} bytes, got {}",
                raw.len()
            ))
        })?;
        Ok(Self(key))
    }

    /// Base64 form expected on the wire.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.0)
    }
}

impl std::fmt::Debug for SseCustomerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SseCustomerKey(<redacted>)")
    }
}

/// S3 configuration with defaults applied and cross-field rules checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedS3 {
    /// Bucket name
    pub bucket: String,
    /// Service endpoint URL, without the bucket
    pub endpoint: String,
    /// Signing region, if known
    pub region: Option<String>,
    /// Whether the transport is TLS
    pub https: bool,
    /// Path-style (true) or virtual-hosted (false) addressing
    pub path_style: bool,
    /// Signing scheme
    pub signature: SignatureVersion,
    /// SSE-C key applied to every object request
    pub ssec_key: Option<SseCustomerKey>,
}

impl ResolvedS3 {
    /// Endpoint handed to the SDK. Virtual-hosted addressing puts the bucket
    /// in the host name.
    pub fn sdk_endpoint(&self) -> String {
        if self.path_style {
            return self.endpoint.clone();
        }
        match self.endpoint.split_once("://") {
            Some((scheme, host)) => format!("{scheme}://{}.{host}", self.bucket),
            None => format!("{}.{}", self.bucket, self.endpoint),
        }
    }
}

impl S3Config {
    /// Apply defaults and validate. Performs no I/O.
    pub fn resolve(&self) -> Result<ResolvedS3> {
        let bucket = self.bucket.trim();
        if bucket.is_empty() {
            return Err(Error::InvalidArgument("S3 bucket is required".to_string()));
        }

        let signature = if parse_bool(&self.v4_signature, false) {
            SignatureVersion::V4
        } else {
            SignatureVersion::V2
        };

        let mut region = self.region.trim().to_string();
        if signature == SignatureVersion::V4 && region.is_empty() {
            region = DEFAULT_REGION.to_string();
        }

        let host = match self.endpoint.trim() {
            "" if region.is_empty() => "s3.amazonaws.com".to_string(),
            "" => format!("s3.{region}.amazonaws.com"),
            endpoint => endpoint.to_string(),
        };
        let (endpoint, https) = endpoint_url(&host, parse_bool(&self.https, true))?;
        let path_style = parse_bool(&self.path_style_request, false);

        let ssec_key = if self.ssec_key.is_empty() {
            None
        } else {
            let key = SseCustomerKey::new(self.ssec_key.as_bytes())?;
            if signature != SignatureVersion::V4 {
                return Err(Error::InvalidArgument(
                    "SSE-C key requires v4 signature".to_string(),
                ));
            }
            if !https {
                return Err(Error::InvalidArgument("SSE-C key requires https".to_string()));
            }
            Some(key)
        };

        Ok(ResolvedS3 {
            bucket: bucket.to_string(),
            endpoint,
            region: (!region.is_empty()).then_some(region),
            https,
            path_style,
            signature,
            ssec_key,
        })
    }

    /// Validate the configuration and build a client.
    pub fn build(&self, settings: ClientSettings) -> Result<StoreClient> {
        let resolved = self.resolve()?;
        let sdk_endpoint = resolved.sdk_endpoint();

        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(&resolved.bucket)
            .with_endpoint(&sdk_endpoint)
            .with_virtual_hosted_style_request(!resolved.path_style)
            .with_allow_http(!resolved.https);

        if let Some(region) = &resolved.region {
            builder = builder.with_region(region);
        }
        if !self.key_id.is_empty() {
            builder = builder
                .with_access_key_id(&self.key_id)
                .with_secret_access_key(&self.key);
        }
        if let Some(key) = &resolved.ssec_key {
            builder = builder.with_ssec_encryption(key.to_base64());
        }
        if resolved.signature == SignatureVersion::V2 {
            warn!(
                "Signature v2 requested for bucket {}; the S3 transport signs with v4",
                resolved.bucket
            );
        }

        let store = builder
            .build()
            .map_err(|e| Error::InvalidArgument(format!("Failed to create S3 client: {e}")))?;

        debug!(
            "S3 endpoint: {}, region: {:?}, path style: {}, SSE-C: {}",
            sdk_endpoint,
            resolved.region,
            resolved.path_style,
            resolved.ssec_key.is_some()
        );

        Ok(StoreClient::new(
            Arc::new(store),
            BackendKind::S3,
            resolved.bucket,
            settings,
        ))
    }
}
