//! Storage configuration types.

use serde::{Deserialize, Deserializer, Serialize};

use super::azure::AzureConfig;
use super::gcs::GcsConfig;
use super::oss::OssConfig;
use super::s3::S3Config;
use crate::{Error, Result};

/// Backend configuration using a tagged enum for type-safe configuration.
///
/// Supports:
/// - S3 and S3-compatible services (MinIO, Ceph RGW, etc.)
/// - Alibaba Cloud OSS
/// - Azure Blob Storage
/// - Google Cloud Storage
/// - In-memory (for testing)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend")]
pub enum BackendConfig {
    /// AWS S3 or S3-compatible storage
    #[serde(rename = "s3")]
    S3(S3Config),

    /// Alibaba Cloud OSS
    #[serde(rename = "oss")]
    Oss(OssConfig),

    /// Azure Blob Storage
    #[serde(rename = "azure")]
    Azure(AzureConfig),

    /// Google Cloud Storage
    #[serde(rename = "gcs")]
    Gcs(GcsConfig),

    /// In-memory storage (for testing)
    #[serde(rename = "memory")]
    Memory,
}

impl BackendConfig {
    /// Parse configuration from a URL string.
    ///
    /// Supported URL formats:
    /// - `s3://bucket?region=us-east-1&endpoint=localhost:9000&https=false&path_style=true&v4_signature=true`
    /// - `oss://bucket?region=cn-hangzhou`
    /// - `azure://container@account.blob.core.windows.net`
    /// - `gcs://bucket`
    /// - `memory://`
    ///
    /// Credentials are taken from the provider's usual environment variables.
    pub fn from_url(url: &str) -> Result<Self> {
        let parsed = url::Url::parse(url)
            .map_err(|e| Error::InvalidArgument(format!("Invalid storage URL: {}", e)))?;
        let query = |name: &str| {
            parsed
                .query_pairs()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.to_string())
                .unwrap_or_default()
        };
        let env = |name: &str| std::env::var(name).unwrap_or_default();

        match parsed.scheme() {
            "s3" | "s3a" => Ok(Self::S3(S3Config {
                endpoint: query("endpoint"),
                region: query("region"),
                https: query("https"),
                bucket: parsed.host_str().unwrap_or_default().to_string(),
                path_style_request: query("path_style"),
                key_id: env("AWS_ACCESS_KEY_ID"),
                key: env("AWS_SECRET_ACCESS_KEY"),
                v4_signature: query("v4_signature"),
                ssec_key: String::new(),
            })),
            "oss" => Ok(Self::Oss(OssConfig {
                endpoint: query("endpoint"),
                region: query("region"),
                https: query("https"),
                bucket: parsed.host_str().unwrap_or_default().to_string(),
                key_id: env("OSS_ACCESS_KEY_ID"),
                key: env("OSS_ACCESS_KEY_SECRET"),
            })),
            "azure" | "az" => {
                let host = parsed.host_str().unwrap_or_default();
                let account_name = host.split('.').next().unwrap_or(host).to_string();
                let container_name = match parsed.username() {
                    "" => parsed.path().trim_matches('/').to_string(),
                    user => user.to_string(),
                };

                Ok(Self::Azure(AzureConfig {
                    account_name,
                    container_name,
                    account_key: std::env::var("AZURE_STORAGE_KEY").ok(),
                    ..Default::default()
                }))
            }
            "gcs" | "gs" => Ok(Self::Gcs(GcsConfig {
                bucket: parsed.host_str().unwrap_or_default().to_string(),
                service_account_path: std::env::var("GOOGLE_APPLICATION_CREDENTIALS").ok(),
            })),
            "memory" => Ok(Self::Memory),
            scheme => Err(Error::InvalidArgument(format!(
                "Unsupported storage URL scheme: {}",
                scheme
            ))),
        }
    }
}

/// Normalize an endpoint host into a URL.
///
/// A bare host gets `https://` or `http://` from the toggle. An explicit
/// scheme takes precedence over the toggle. Returns the URL without a
/// trailing slash and whether it uses TLS.
pub(crate) fn endpoint_url(endpoint: &str, https: bool) -> Result<(String, bool)> {
    let candidate = if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        let scheme = if https { "https" } else { "http" };
        format!("{scheme}://{endpoint}")
    };
    let parsed = url::Url::parse(&candidate)
        .map_err(|e| Error::InvalidArgument(format!("Invalid endpoint {endpoint:?}: {e}")))?;
    let secure = match parsed.scheme() {
        "https" => true,
        "http" => false,
        other => {
            return Err(Error::InvalidArgument(format!(
                "Unsupported endpoint scheme {other:?} in {endpoint:?}"
            )))
        }
    };
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(Error::InvalidArgument(format!(
            "Endpoint {endpoint:?} has no host"
        )));
    }
    Ok((candidate.trim_end_matches('/').to_string(), secure))
}

/// Accept a toggle written either as a YAML boolean or as a string.
pub(crate) fn flag<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => value.to_string(),
        Flag::Text(value) => value,
    })
}
