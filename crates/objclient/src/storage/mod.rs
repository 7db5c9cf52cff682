//! Storage backend abstraction and implementations.
//!
//! Every backend is exposed through the same [`ObjectClient`] interface:
//!
//! - **S3**: AWS S3 and S3-compatible services (MinIO, Ceph RGW, etc.)
//! - **OSS**: Alibaba Cloud OSS
//! - **Azure**: Azure Blob Storage
//! - **GCS**: Google Cloud Storage
//! - **Memory**: In-memory storage (for testing)

mod adapter;
mod azure;
mod client;
mod config;
mod gcs;
mod keys;
mod memory;
mod oss;
mod s3;

pub use adapter::{BackendKind, StoreClient};
pub use azure::AzureConfig;
pub use client::{BodyReader, ObjectClient, ObjectInfo, ObjectItem, ObjectReader, WriteOptions};
pub use config::BackendConfig;
pub use gcs::GcsConfig;
pub use oss::{OssConfig, ResolvedOss};
pub use s3::{ResolvedS3, S3Config, SignatureVersion, SseCustomerKey, DEFAULT_REGION, SSEC_KEY_LEN};

use crate::config::ClientSettings;
use crate::Result;
use std::sync::Arc;

impl BackendConfig {
    /// Validate the configuration and build the matching client.
    pub fn build(&self, settings: ClientSettings) -> Result<StoreClient> {
        match self {
            BackendConfig::S3(config) => config.build(settings),
            BackendConfig::Oss(config) => config.build(settings),
            BackendConfig::Azure(config) => config.build(settings),
            BackendConfig::Gcs(config) => config.build(settings),
            BackendConfig::Memory => Ok(StoreClient::memory(settings)),
        }
    }
}

/// Create a shared client from configuration.
///
/// # Example
///
/// ```rust,ignore
/// use objclient::storage::{connect, BackendConfig};
/// use objclient::ClientSettings;
///
/// let config = BackendConfig::from_url("memory://")?;
/// let client = connect(&config, ClientSettings::default())?;
/// ```
pub fn connect(config: &BackendConfig, settings: ClientSettings) -> Result<Arc<dyn ObjectClient>> {
    Ok(Arc::new(config.build(settings)?))
}
