//! Google Cloud Storage backend.

use object_store::gcp::GoogleCloudStorageBuilder;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::adapter::{BackendKind, StoreClient};
use crate::config::ClientSettings;
use crate::{Error, Result};

/// Google Cloud Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GcsConfig {
    /// GCS bucket name
    pub bucket: String,
    /// Path to a service account JSON key file (if None, uses Application Default Credentials)
    #[serde(default)]
    pub service_account_path: Option<String>,
}

impl GcsConfig {
    /// Build a client.
    ///
    /// Without `service_account_path` the SDK falls back to Application
    /// Default Credentials when the first request is signed.
    pub fn build(&self, settings: ClientSettings) -> Result<StoreClient> {
        if self.bucket.is_empty() {
            return Err(Error::InvalidArgument("GCS bucket is required".to_string()));
        }

        let mut builder = GoogleCloudStorageBuilder::new().with_bucket_name(&self.bucket);
        if let Some(path) = &self.service_account_path {
            builder = builder.with_service_account_path(path);
        }

        let store = builder
            .build()
            .map_err(|e| Error::InvalidArgument(format!("Failed to create GCS client: {}", e)))?;

        Ok(StoreClient::new(
            Arc::new(store),
            BackendKind::Gcs,
            self.bucket.clone(),
            settings,
        ))
    }
}
