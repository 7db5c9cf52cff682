//! Azure Blob Storage backend.

use object_store::azure::MicrosoftAzureBuilder;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::adapter::{BackendKind, StoreClient};
use crate::config::ClientSettings;
use crate::{Error, Result};

/// Azure Blob Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AzureConfig {
    /// Storage account name
    pub account_name: String,
    /// Blob container name
    pub container_name: String,
    /// Storage account key
    #[serde(default)]
    pub account_key: Option<String>,
    /// Custom endpoint URL (sovereign clouds, Azurite)
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Azure AD client ID (service principal)
    #[serde(default)]
    pub client_id: Option<String>,
    /// Azure AD tenant ID (service principal)
    #[serde(default)]
    pub tenant_id: Option<String>,
    /// Client secret (service principal)
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Shared access signature query string
    #[serde(default)]
    pub sas_token: Option<String>,
}

/// Split a SAS query string into key/value pairs.
fn sas_pairs(token: &str) -> Vec<(String, String)> {
    token
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl AzureConfig {
    /// Build a client.
    ///
    /// Authentication, in order of precedence:
    /// 1. SAS token (`sas_token`)
    /// 2. Storage account key (`account_key`)
    /// 3. Service principal (`client_id` + `client_secret` + `tenant_id`)
    /// 4. The SDK's default chain (environment, managed identity)
    pub fn build(&self, settings: ClientSettings) -> Result<StoreClient> {
        if self.account_name.is_empty() || self.container_name.is_empty() {
            return Err(Error::InvalidArgument(
                "Azure account_name and container_name are required".to_string(),
            ));
        }

        let mut builder = MicrosoftAzureBuilder::new()
            .with_account(&self.account_name)
            .with_container_name(&self.container_name);

        if let Some(endpoint) = &self.endpoint {
            builder = builder.with_endpoint(endpoint.clone());
            if endpoint.starts_with("http://") {
                builder = builder.with_allow_http(true);
            }
        }

        if let Some(sas_token) = &self.sas_token {
            builder = builder.with_sas_authorization(sas_pairs(sas_token));
            debug!("Azure authentication: SAS token");
        } else if let Some(key) = &self.account_key {
            builder = builder.with_access_key(key);
            debug!("Azure authentication: Account key");
        } else if let Some(secret) = &self.client_secret {
            if let Some(client_id) = &self.client_id {
                builder = builder.with_client_id(client_id);
            }
            if let Some(tenant_id) = &self.tenant_id {
                builder = builder.with_tenant_id(tenant_id);
            }
            builder = builder.with_client_secret(secret);
            debug!("Azure authentication: Service principal");
        } else {
            debug!("Azure authentication: default credential chain");
        }

        let store = builder
            .build()
            .map_err(|e| Error::InvalidArgument(format!("Failed to create Azure client: {}", e)))?;

        Ok(StoreClient::new(
            Arc::new(store),
            BackendKind::Azure,
            format!("{}/{}", self.account_name, self.container_name),
            settings,
        ))
    }
}
