//! Client operation tests.
//!
//! Covers the full object lifecycle on the in-memory backend:
//! - write/read/info/copy/remove
//! - metadata normalization
//! - existence checks and not-found mapping
//! - batch removal semantics

use objclient::{connect, BackendConfig, ClientSettings, Context, Error, ObjectClient, WriteOptions};

use super::helpers::{list_keys, memory_client, put, read_all};

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn client_object_lifecycle() {
    let client = connect(&BackendConfig::Memory, ClientSettings::default()).unwrap();
    let ctx = Context::background();

    put(client.as_ref(), "a/b", b"demo").await;
    assert_eq!(read_all(client.as_ref(), "a/b").await, b"demo");
    assert_eq!(client.info(&ctx, "a/b").await.unwrap().size, 4);

    client.copy(&ctx, "a/b", "a/c").await.unwrap();
    assert!(client.exist(&ctx, "a/c").await.unwrap());
    assert_eq!(list_keys(client.as_ref(), "a/").await, vec!["a/b", "a/c"]);

    client
        .remove(&ctx, &["a/b".to_string(), "a/c".to_string()])
        .await
        .unwrap();
    assert!(list_keys(client.as_ref(), "a/").await.is_empty());
}

#[tokio::test]
async fn client_copy_is_independent_of_source() {
    let client = memory_client();
    let ctx = Context::background();

    put(&client, "src", b"v1").await;
    client.copy(&ctx, "src", "dst").await.unwrap();
    put(&client, "src", b"version-2").await;

    assert_eq!(read_all(&client, "dst").await, b"v1");
    assert_eq!(read_all(&client, "src").await, b"version-2");
}

#[tokio::test]
async fn client_copy_missing_source_is_not_found() {
    let client = memory_client();
    let err = client
        .copy(&Context::background(), "missing", "dst")
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "{err}");
}

#[tokio::test]
async fn client_write_without_size_on_memory_backend() {
    let client = memory_client();
    let mut body = &b"no length given"[..];
    client
        .write(&Context::background(), "k", &mut body, &WriteOptions::default())
        .await
        .unwrap();
    assert_eq!(read_all(&client, "k").await, b"no length given");
}

#[tokio::test]
async fn client_write_larger_than_single_put_buffer() {
    let client = memory_client();
    let data: Vec<u8> = (0..20 * 1024 * 1024).map(|i| (i % 251) as u8).collect();
    put(&client, "big", &data).await;

    let info = client.info(&Context::background(), "big").await.unwrap();
    assert_eq!(info.size, data.len() as u64);
    assert_eq!(read_all(&client, "big").await, data);
}

#[tokio::test]
async fn client_rejects_invalid_keys_before_io() {
    let client = memory_client();
    let ctx = Context::background();

    for key in ["", "/lead", "trail/", "a//b"] {
        let mut body = &b"x"[..];
        let err = client
            .write(&ctx, key, &mut body, &WriteOptions::with_size(1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)), "{key:?}: {err}");
        assert!(matches!(client.exist(&ctx, key).await, Err(Error::InvalidArgument(_))));
    }
}

// ============================================================================
// Metadata
// ============================================================================

#[tokio::test]
async fn client_metadata_keys_are_lowercased() {
    let client = memory_client();
    let ctx = Context::background();

    let options = WriteOptions::with_size(4)
        .metadata("Content-Owner", "Team-A")
        .metadata("x-trace", "42");
    let mut body = &b"demo"[..];
    client.write(&ctx, "m", &mut body, &options).await.unwrap();

    let info = client.info(&ctx, "m").await.unwrap();
    assert_eq!(info.metadata.len(), 2);
    assert_eq!(info.metadata.get("content-owner").map(String::as_str), Some("Team-A"));
    assert_eq!(info.metadata.get("x-trace").map(String::as_str), Some("42"));
}

#[tokio::test]
async fn client_metadata_case_collision_rejected() {
    let client = memory_client();
    let ctx = Context::background();

    let options = WriteOptions::with_size(1)
        .metadata("Owner", "a")
        .metadata("OWNER", "b");
    let mut body = &b"x"[..];
    let err = client.write(&ctx, "m", &mut body, &options).await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert!(!client.exist(&ctx, "m").await.unwrap());
}

#[tokio::test]
async fn client_info_without_metadata_is_empty() {
    let client = memory_client();
    put(&client, "plain", b"abc").await;
    let info = client.info(&Context::background(), "plain").await.unwrap();
    assert!(info.metadata.is_empty());
}

// ============================================================================
// Existence
// ============================================================================

#[tokio::test]
async fn client_exist_true_and_false() {
    let client = memory_client();
    let ctx = Context::background();

    put(&client, "here", b"1").await;
    assert!(client.exist(&ctx, "here").await.unwrap());
    assert!(!client.exist(&ctx, "not-here").await.unwrap());
}

#[tokio::test]
async fn client_read_missing_is_not_found() {
    let client = memory_client();
    let err = client.read(&Context::background(), "ghost").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(ref key) if key == "ghost"));
}

// ============================================================================
// Removal
// ============================================================================

#[tokio::test]
async fn client_remove_empty_is_noop() {
    let client = memory_client();
    client.remove(&Context::background(), &[]).await.unwrap();
}

#[tokio::test]
async fn client_remove_tolerates_missing_keys() {
    let client = memory_client();
    let ctx = Context::background();

    put(&client, "x/1", b"1").await;
    client
        .remove(&ctx, &["x/1".to_string(), "x/absent".to_string()])
        .await
        .unwrap();
    assert!(!client.exist(&ctx, "x/1").await.unwrap());
}

#[tokio::test]
async fn client_remove_validates_all_keys_first() {
    let client = memory_client();
    let ctx = Context::background();

    put(&client, "keep", b"1").await;
    let err = client
        .remove(&ctx, &["keep".to_string(), "bad//key".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert!(client.exist(&ctx, "keep").await.unwrap());
}

#[tokio::test]
async fn client_remove_many_keys() {
    let client = memory_client();
    let ctx = Context::background();

    let keys: Vec<String> = (0..50).map(|i| format!("batch/{i:03}")).collect();
    for key in &keys {
        put(&client, key, b"x").await;
    }
    client.remove(&ctx, &keys).await.unwrap();
    assert!(list_keys(&client, "batch/").await.is_empty());
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn client_operations_observe_cancelled_context() {
    let client = memory_client();
    put(&client, "k", b"v").await;

    let ctx = Context::background();
    ctx.cancel();

    assert!(client.read(&ctx, "k").await.unwrap_err().is_canceled());
    assert!(client.info(&ctx, "k").await.unwrap_err().is_canceled());
    assert!(client.list(&ctx, "").await.unwrap_err().is_canceled());
    assert!(client.copy(&ctx, "k", "k2").await.unwrap_err().is_canceled());
    assert!(client
        .remove(&ctx, &["k".to_string()])
        .await
        .unwrap_err()
        .is_canceled());

    let fresh = Context::background();
    assert!(client.exist(&fresh, "k").await.unwrap());
    assert!(!client.exist(&fresh, "k2").await.unwrap());
}
