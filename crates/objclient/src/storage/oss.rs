//! Alibaba Cloud OSS backend, spoken through the S3-compatible API.

use object_store::aws::AmazonS3Builder;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::adapter::{BackendKind, StoreClient};
use super::config::{endpoint_url, flag};
use crate::config::{parse_bool, ClientSettings};
use crate::{Error, Result};

/// Raw OSS configuration. `https` is on unless literally `"false"`.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OssConfig {
    /// Endpoint host; derived from `region` when blank
    pub endpoint: String,
    /// Region ID such as `cn-hangzhou`
    pub region: String,
    /// Use HTTPS (default on)
    #[serde(deserialize_with = "flag")]
    pub https: String,
    /// Bucket name
    pub bucket: String,
    /// AccessKey ID
    pub key_id: String,
    /// AccessKey secret
    pub key: String,
}

impl std::fmt::Debug for OssConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OssConfig")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("https", &self.https)
            .field("bucket", &self.bucket)
            .field("key_id", &self.key_id)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// OSS configuration with the endpoint filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOss {
    /// Bucket name
    pub bucket: String,
    /// Service endpoint URL, without the bucket
    pub endpoint: String,
    /// Signing region, if given
    pub region: Option<String>,
    /// Whether the transport is TLS
    pub https: bool,
}

impl ResolvedOss {
    /// OSS only serves virtual-hosted addressing.
    pub fn sdk_endpoint(&self) -> String {
        match self.endpoint.split_once("://") {
            Some((scheme, host)) => format!("{scheme}://{}.{host}", self.bucket),
            None => format!("{}.{}", self.bucket, self.endpoint),
        }
    }
}

impl OssConfig {
    /// Apply defaults and validate. Performs no I/O.
    pub fn resolve(&self) -> Result<ResolvedOss> {
        let bucket = self.bucket.trim();
        if bucket.is_empty() {
            return Err(Error::InvalidArgument("OSS bucket is required".to_string()));
        }

        let region = self.region.trim();
        let host = match self.endpoint.trim() {
            "" if region.is_empty() => {
                return Err(Error::InvalidArgument(
                    "OSS endpoint or region is required".to_string(),
                ))
            }
            "" => format!("oss-{region}.aliyuncs.com"),
            endpoint => endpoint.to_string(),
        };
        let (endpoint, https) = endpoint_url(&host, parse_bool(&self.https, true))?;

        Ok(ResolvedOss {
            bucket: bucket.to_string(),
            endpoint,
            region: (!region.is_empty()).then(|| region.to_string()),
            https,
        })
    }

    /// Validate the configuration and build a client.
    pub fn build(&self, settings: ClientSettings) -> Result<StoreClient> {
        let resolved = self.resolve()?;
        let sdk_endpoint = resolved.sdk_endpoint();

        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(&resolved.bucket)
            .with_endpoint(&sdk_endpoint)
            .with_virtual_hosted_style_request(true)
            .with_allow_http(!resolved.https);

        if let Some(region) = &resolved.region {
            builder = builder.with_region(region);
        }
        if !self.key_id.is_empty() {
            builder = builder
                .with_access_key_id(&self.key_id)
                .with_secret_access_key(&self.key);
        }

        let store = builder
            .build()
            .map_err(|e| Error::InvalidArgument(format!("Failed to create OSS client: {e}")))?;

        debug!("OSS endpoint: {}, region: {:?}", sdk_endpoint, resolved.region);

        Ok(StoreClient::new(
            Arc::new(store),
            BackendKind::Oss,
            resolved.bucket,
            settings,
        ))
    }
}
