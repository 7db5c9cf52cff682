//! The unified client interface implemented by every backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::io::AsyncRead;

use crate::context::Context;
use crate::watchdog::StallGuard;
use crate::Result;

/// Byte stream handed to [`ObjectClient::write`].
pub type BodyReader<'a> = &'a mut (dyn AsyncRead + Send + Unpin);

/// Open object stream returned by [`ObjectClient::read`].
///
/// The caller must release it with [`StallGuard::close`] (or drop it) once
/// done; an open reader keeps its connection and watchdog task alive.
pub type ObjectReader = StallGuard<Box<dyn AsyncRead + Send + Unpin>>;

/// One entry of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectItem {
    /// Full object key
    pub key: String,
    /// Size in bytes
    pub size: u64,
    /// Last modified timestamp
    pub last_modified: DateTime<Utc>,
}

/// Point-in-time stat of a single object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Size in bytes
    pub size: u64,
    /// Last modified timestamp
    pub last_modified: DateTime<Utc>,
    /// User metadata with lower-case keys
    pub metadata: HashMap<String, String>,
}

/// Options for [`ObjectClient::write`].
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Content length. Required by backends that cannot stream an unknown
    /// length; zero counts as absent.
    pub size: Option<u64>,
    /// User metadata. Keys are lower-cased before transmission.
    pub metadata: HashMap<String, String>,
}

impl WriteOptions {
    /// Options carrying only a content length.
    pub fn with_size(size: u64) -> Self {
        Self {
            size: Some(size),
            metadata: HashMap::new(),
        }
    }

    /// Add one metadata entry.
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The declared size, treating zero as unknown.
    pub fn known_size(&self) -> Option<u64> {
        self.size.filter(|&size| size > 0)
    }
}

/// Backend-agnostic object storage operations.
///
/// Implementations are shared between tasks (`Arc<dyn ObjectClient>`) and
/// keep no per-call state. Every operation observes the context: once it
/// is cancelled or past its deadline the call returns
/// [`Error::Canceled`](crate::Error::Canceled).
#[async_trait]
pub trait ObjectClient: Send + Sync + std::fmt::Debug {
    /// Open a stream over the object's current content.
    async fn read(&self, ctx: &Context, key: &str) -> Result<ObjectReader>;

    /// Upload the whole of `body` to `key`, replacing any existing object.
    async fn write(
        &self,
        ctx: &Context,
        key: &str,
        body: BodyReader<'_>,
        options: &WriteOptions,
    ) -> Result<()>;

    /// Whether `key` exists. Absence is `Ok(false)`, not an error.
    async fn exist(&self, ctx: &Context, key: &str) -> Result<bool>;

    /// Delete every key, reporting the first failure.
    async fn remove(&self, ctx: &Context, keys: &[String]) -> Result<()>;

    /// All objects whose key starts with `prefix`; empty lists everything.
    async fn list(&self, ctx: &Context, prefix: &str) -> Result<Vec<ObjectItem>>;

    /// Size, modification time and metadata of `key`.
    async fn info(&self, ctx: &Context, key: &str) -> Result<ObjectInfo>;

    /// Server-side copy within the bucket.
    async fn copy(&self, ctx: &Context, src: &str, dst: &str) -> Result<()>;
}
