//! Backend-agnostic object storage client.
//!
//! One [`ObjectClient`] interface over S3 (and S3-compatible services),
//! Alibaba Cloud OSS, Azure Blob Storage, Google Cloud Storage and an
//! in-memory store. Streaming transfers are supervised by a
//! [`StallGuard`] that cancels them once no byte has moved for the
//! configured stall timeout.
//!
//! ```rust,ignore
//! use objclient::{connect, BackendConfig, ClientSettings, Context, WriteOptions};
//!
//! let config = BackendConfig::from_url("s3://backups?region=eu-west-1&v4_signature=true")?;
//! let client = connect(&config, ClientSettings::default())?;
//! let ctx = Context::background();
//!
//! let mut body = &b"hello"[..];
//! client.write(&ctx, "a/b", &mut body, &WriteOptions::with_size(5)).await?;
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod storage;
pub mod watchdog;

pub use config::{parse_bool, ClientSettings};
pub use context::Context;
pub use error::{Error, Result};
pub use storage::{
    connect, BackendConfig, BackendKind, ObjectClient, ObjectInfo, ObjectItem, ObjectReader,
    StoreClient, WriteOptions,
};
pub use watchdog::{StallGuard, DEFAULT_STALL_TIMEOUT};
