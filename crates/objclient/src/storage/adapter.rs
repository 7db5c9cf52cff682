//! Generic adapter mapping the unified interface onto an `object_store` SDK
//! handle.
//!
//! Each provider module (`s3`, `oss`, `azure`, `gcs`, `memory`) resolves its
//! configuration and builds a [`StoreClient`] tagged with its
//! [`BackendKind`]. The tag decides the behavior that differs between
//! providers, such as whether writes need an advance size.

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use object_store::buffered::BufWriter;
use object_store::path::Path;
use object_store::{GetOptions, ObjectMeta, ObjectStore};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio_util::io::StreamReader;
use tracing::{debug, info, warn};

use super::client::{BodyReader, ObjectClient, ObjectInfo, ObjectItem, ObjectReader, WriteOptions};
use super::keys::{incoming_metadata, list_root, object_path, outgoing_metadata};
use crate::config::ClientSettings;
use crate::context::Context;
use crate::watchdog::StallGuard;
use crate::{Error, Result};

/// Largest upload buffer. Bodies that fit go out as a single PUT; larger or
/// unsized bodies are handed to the SDK's buffered multipart writer.
const MAX_SINGLE_PUT: u64 = 16 * 1024 * 1024;

/// Storage provider a [`StoreClient`] talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// AWS S3 and S3-compatible services
    S3,
    /// Alibaba Cloud OSS
    Oss,
    /// Azure Blob Storage
    Azure,
    /// Google Cloud Storage
    Gcs,
    /// In-process store (for testing)
    Memory,
}

impl BackendKind {
    /// Short name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::S3 => "S3",
            BackendKind::Oss => "OSS",
            BackendKind::Azure => "Azure",
            BackendKind::Gcs => "GCS",
            BackendKind::Memory => "Memory",
        }
    }

    /// Whether writes must declare their size before any byte is sent.
    ///
    /// S3 uploads are sized up front so the buffer can be bounded; the
    /// other providers accept a stream of unknown length.
    pub fn requires_size(&self) -> bool {
        matches!(self, BackendKind::S3)
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// [`ObjectClient`] over any `object_store` handle.
pub struct StoreClient {
    store: Arc<dyn ObjectStore>,
    kind: BackendKind,
    target: String,
    settings: ClientSettings,
}

impl StoreClient {
    /// Wrap an SDK handle. `target` names the bucket/container for logs.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        kind: BackendKind,
        target: impl Into<String>,
        settings: ClientSettings,
    ) -> Self {
        let target = target.into();
        info!("Created {} client for {}", kind, target);
        Self {
            store,
            kind,
            target,
            settings,
        }
    }

    /// The provider this client talks to.
    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    /// Settings the client was built with.
    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Context for a single non-streaming request.
    fn request_context(&self, ctx: &Context) -> Context {
        match self.settings.request_timeout() {
            Some(timeout) => ctx.with_timeout(timeout),
            None => ctx.child(),
        }
    }

    fn map_error(&self, op: &'static str, key: &str, err: object_store::Error) -> Error {
        match err {
            object_store::Error::NotFound { .. } => Error::NotFound(key.to_string()),
            other => Error::backend(op, format!("{}:{}", self.target, key), other),
        }
    }

    fn to_item(meta: ObjectMeta) -> ObjectItem {
        ObjectItem {
            key: meta.location.to_string(),
            size: meta.size as u64,
            last_modified: meta.last_modified,
        }
    }

    /// Fetch one listing page of at most `page_size` entries after `token`.
    async fn list_page(
        &self,
        root: Option<&Path>,
        token: Option<&Path>,
        prefix: &str,
    ) -> Result<Vec<ObjectMeta>> {
        let page_size = self.settings.page_size();
        let stream = match token {
            Some(offset) => self.store.list_with_offset(root, offset),
            None => self.store.list(root),
        };
        stream
            .take(page_size)
            .try_collect::<Vec<_>>()
            .await
            .map_err(|e| self.map_error("LIST", prefix, e))
    }

    async fn upload(
        &self,
        op_ctx: &Context,
        key: &str,
        path: Path,
        body: BodyReader<'_>,
        options: &WriteOptions,
    ) -> Result<()> {
        let attributes = outgoing_metadata(&options.metadata)?;
        let declared = options.known_size();
        // The writer switches to multipart once the buffer fills, so leave
        // one byte of headroom for bodies of exactly the declared size.
        let capacity = declared
            .map_or(MAX_SINGLE_PUT, |size| size.saturating_add(1))
            .min(MAX_SINGLE_PUT) as usize;

        let mut writer = BufWriter::with_capacity(Arc::clone(&self.store), path, capacity)
            .with_attributes(attributes);
        let mut guarded = StallGuard::new(body, op_ctx.clone(), self.settings.stall_timeout());

        let outcome = op_ctx
            .run(async {
                let written = tokio::io::copy(&mut guarded, &mut writer)
                    .await
                    .map_err(|e| Error::from_io("PUT", key, e))?;
                if let Some(expected) = declared {
                    if written != expected {
                        return Err(Error::InvalidArgument(format!(
                            "declared size {expected} for {key} but body had {written} bytes"
                        )));
                    }
                }
                writer
                    .shutdown()
                    .await
                    .map_err(|e| Error::from_io("PUT", key, e))
            })
            .await;
        guarded.close();

        if outcome.is_err() {
            if let Err(e) = writer.abort().await {
                warn!("{} PUT abort for {} failed: {}", self.kind, key, e);
            }
        }
        outcome
    }
}

impl std::fmt::Debug for StoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreClient")
            .field("kind", &self.kind)
            .field("target", &self.target)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ObjectClient for StoreClient {
    async fn read(&self, ctx: &Context, key: &str) -> Result<ObjectReader> {
        let path = object_path(key)?;
        debug!("{} GET: {}", self.kind, path);

        let op_ctx = ctx.child();
        let fetched = op_ctx
            .run(async {
                self.store
                    .get(&path)
                    .await
                    .map_err(|e| self.map_error("GET", key, e))
            })
            .await;
        let result = match fetched {
            Ok(result) => result,
            Err(e) => {
                op_ctx.cancel();
                return Err(e);
            }
        };

        let stream = result.into_stream().map_err(std::io::Error::other);
        let reader: Box<dyn tokio::io::AsyncRead + Send + Unpin> =
            Box::new(StreamReader::new(stream));
        Ok(StallGuard::new(reader, op_ctx, self.settings.stall_timeout()))
    }

    async fn write(
        &self,
        ctx: &Context,
        key: &str,
        body: BodyReader<'_>,
        options: &WriteOptions,
    ) -> Result<()> {
        let path = object_path(key)?;
        if self.kind.requires_size() && options.known_size().is_none() {
            return Err(Error::InvalidArgument(format!(
                "{} writes require the size option for {}",
                self.kind, key
            )));
        }
        debug!("{} PUT: {} (size: {:?})", self.kind, path, options.size);

        let op_ctx = ctx.child();
        let outcome = self.upload(&op_ctx, key, path, body, options).await;
        op_ctx.cancel();
        outcome
    }

    async fn exist(&self, ctx: &Context, key: &str) -> Result<bool> {
        let path = object_path(key)?;
        debug!("{} HEAD: {}", self.kind, path);

        self.request_context(ctx)
            .run(async {
                match self.store.head(&path).await {
                    Ok(_) => Ok(true),
                    Err(object_store::Error::NotFound { .. }) => Ok(false),
                    Err(e) => Err(self.map_error("HEAD", key, e)),
                }
            })
            .await
    }

    async fn remove(&self, ctx: &Context, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let paths = keys
            .iter()
            .map(|key| object_path(key).map(|path| (key.clone(), path)))
            .collect::<Result<Vec<_>>>()?;
        debug!("{} DELETE: {} keys", self.kind, paths.len());

        let outcomes: Vec<(String, Result<()>)> = self
            .request_context(ctx)
            .run(async {
                let outcomes = stream::iter(paths)
                    .map(|(key, path)| async move {
                        let outcome = match self.store.delete(&path).await {
                            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
                            Err(e) => Err(self.map_error("DELETE", &key, e)),
                        };
                        (key, outcome)
                    })
                    .buffered(self.settings.delete_parallelism())
                    .collect::<Vec<_>>()
                    .await;
                Ok(outcomes)
            })
            .await?;

        match outcomes.into_iter().find_map(|(key, outcome)| outcome.err().map(|e| (key, e))) {
            Some((key, source)) => Err(Error::PartialBatchFailure {
                key,
                source: Box::new(source),
            }),
            None => Ok(()),
        }
    }

    async fn list(&self, ctx: &Context, prefix: &str) -> Result<Vec<ObjectItem>> {
        // Listings are rooted at the last complete directory of the prefix;
        // a prefix with no '/' scans the whole bucket and filters here.
        let root = list_root(prefix);
        debug!("{} LIST: {:?} (prefix: {:?})", self.kind, root, prefix);

        ctx.run(async {
            let page_size = self.settings.page_size();
            let mut items = Vec::new();
            let mut token: Option<Path> = None;
            loop {
                let page = self.list_page(root.as_ref(), token.as_ref(), prefix).await?;
                let full = page.len() == page_size;
                token = page.last().map(|meta| meta.location.clone());

                items.extend(
                    page.into_iter()
                        .filter(|meta| meta.location.as_ref().starts_with(prefix))
                        .map(Self::to_item),
                );

                if !full || token.is_none() {
                    break;
                }
            }
            Ok(items)
        })
        .await
    }

    async fn info(&self, ctx: &Context, key: &str) -> Result<ObjectInfo> {
        let path = object_path(key)?;
        debug!("{} HEAD (info): {}", self.kind, path);

        self.request_context(ctx)
            .run(async {
                let options = GetOptions {
                    head: true,
                    ..Default::default()
                };
                let result = self
                    .store
                    .get_opts(&path, options)
                    .await
                    .map_err(|e| self.map_error("HEAD", key, e))?;
                Ok(ObjectInfo {
                    size: result.meta.size as u64,
                    last_modified: result.meta.last_modified,
                    metadata: incoming_metadata(&result.attributes),
                })
            })
            .await
    }

    async fn copy(&self, ctx: &Context, src: &str, dst: &str) -> Result<()> {
        let src_path = object_path(src)?;
        let dst_path = object_path(dst)?;
        debug!("{} COPY: {} -> {}", self.kind, src_path, dst_path);

        self.request_context(ctx)
            .run(async {
                self.store
                    .copy(&src_path, &dst_path)
                    .await
                    .map_err(|e| self.map_error("COPY", src, e))
            })
            .await
    }
}
