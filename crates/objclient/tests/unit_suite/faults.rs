//! Failure propagation tests.
//!
//! Wraps the in-memory store so individual provider calls fail, then checks
//! what the client reports:
//! - batch removal names the first failing key
//! - a listing error discards the pages already fetched

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{
    GetOptions, GetResult, ListResult, MultipartUpload, ObjectMeta, ObjectStore, PutMultipartOpts,
    PutOptions, PutPayload, PutResult,
};
use objclient::{BackendKind, ClientSettings, Context, Error, ObjectClient, StoreClient};

use super::helpers::{list_keys, put};

/// In-memory store that refuses some deletes and every offset listing.
#[derive(Debug, Default)]
struct FaultyStore {
    inner: InMemory,
    deny_delete: Vec<String>,
    fail_paged_list: bool,
}

impl fmt::Display for FaultyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FaultyStore({})", self.inner)
    }
}

fn injected(reason: &str) -> object_store::Error {
    object_store::Error::Generic {
        store: "faulty",
        source: reason.to_string().into(),
    }
}

#[async_trait]
impl ObjectStore for FaultyStore {
    async fn put_opts(
        &self,
        location: &Path,
        payload: PutPayload,
        opts: PutOptions,
    ) -> object_store::Result<PutResult> {
        self.inner.put_opts(location, payload, opts).await
    }

    async fn put_multipart_opts(
        &self,
        location: &Path,
        opts: PutMultipartOpts,
    ) -> object_store::Result<Box<dyn MultipartUpload>> {
        self.inner.put_multipart_opts(location, opts).await
    }

    async fn get_opts(
        &self,
        location: &Path,
        options: GetOptions,
    ) -> object_store::Result<GetResult> {
        self.inner.get_opts(location, options).await
    }

    async fn delete(&self, location: &Path) -> object_store::Result<()> {
        if self.deny_delete.iter().any(|key| key == location.as_ref()) {
            return Err(injected("access denied"));
        }
        self.inner.delete(location).await
    }

    fn list(&self, prefix: Option<&Path>) -> BoxStream<'_, object_store::Result<ObjectMeta>> {
        self.inner.list(prefix)
    }

    fn list_with_offset(
        &self,
        prefix: Option<&Path>,
        offset: &Path,
    ) -> BoxStream<'_, object_store::Result<ObjectMeta>> {
        if self.fail_paged_list {
            return stream::once(async { Err(injected("listing interrupted")) }).boxed();
        }
        self.inner.list_with_offset(prefix, offset)
    }

    async fn list_with_delimiter(&self, prefix: Option<&Path>) -> object_store::Result<ListResult> {
        self.inner.list_with_delimiter(prefix).await
    }

    async fn copy(&self, from: &Path, to: &Path) -> object_store::Result<()> {
        self.inner.copy(from, to).await
    }

    async fn copy_if_not_exists(&self, from: &Path, to: &Path) -> object_store::Result<()> {
        self.inner.copy_if_not_exists(from, to).await
    }
}

fn faulty_client(store: FaultyStore, settings: ClientSettings) -> StoreClient {
    StoreClient::new(Arc::new(store), BackendKind::Memory, "faulty", settings)
}

// ============================================================================
// Batch removal
// ============================================================================

#[tokio::test]
async fn faults_remove_reports_first_failing_key_in_input_order() {
    let store = FaultyStore {
        deny_delete: vec!["deny1".to_string(), "deny2".to_string()],
        ..Default::default()
    };
    let client = faulty_client(store, ClientSettings::default());
    let ctx = Context::background();

    let keys: Vec<String> = ["ok1", "deny1", "ok2", "deny2"]
        .iter()
        .map(|key| key.to_string())
        .collect();
    for key in &keys {
        put(&client, key, b"x").await;
    }

    let err = client.remove(&ctx, &keys).await.unwrap_err();
    match err {
        Error::PartialBatchFailure { key, source } => {
            assert_eq!(key, "deny1");
            assert!(matches!(*source, Error::Backend { op: "DELETE", .. }), "{source}");
        }
        other => panic!("Expected partial batch failure, got {other:?}"),
    }

    // The keys that could be deleted were deleted
    assert!(!client.exist(&ctx, "ok1").await.unwrap());
    assert!(!client.exist(&ctx, "ok2").await.unwrap());
    assert!(client.exist(&ctx, "deny1").await.unwrap());
    assert!(client.exist(&ctx, "deny2").await.unwrap());
}

#[tokio::test]
async fn faults_remove_single_denied_key() {
    let store = FaultyStore {
        deny_delete: vec!["locked".to_string()],
        ..Default::default()
    };
    let client = faulty_client(store, ClientSettings::default());
    put(&client, "locked", b"x").await;

    let err = client
        .remove(&Context::background(), &["locked".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::PartialBatchFailure { ref key, .. } if key == "locked"));
    assert!(err.is_retryable());
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn faults_list_error_discards_partial_pages() {
    let store = FaultyStore {
        fail_paged_list: true,
        ..Default::default()
    };
    let client = faulty_client(
        store,
        ClientSettings {
            list_page_size: 2,
            ..Default::default()
        },
    );
    for i in 0..5 {
        put(&client, &format!("pages/{i}"), b"x").await;
    }

    let err = client
        .list(&Context::background(), "pages/")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Backend { op: "LIST", .. }), "{err}");
}

#[tokio::test]
async fn faults_list_single_page_unaffected() {
    let store = FaultyStore {
        fail_paged_list: true,
        ..Default::default()
    };
    let client = faulty_client(store, ClientSettings::default());
    put(&client, "one/a", b"x").await;
    put(&client, "one/b", b"x").await;

    assert_eq!(list_keys(&client, "one/").await, vec!["one/a", "one/b"]);
}
