//! Test helper utilities.

use objclient::{ClientSettings, Context, ObjectClient, StoreClient, WriteOptions};
use tokio::io::AsyncReadExt;

/// Route client logs to the test harness. Filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// In-memory client with default settings
pub fn memory_client() -> StoreClient {
    StoreClient::memory(ClientSettings::default())
}

/// In-memory client with custom settings
pub fn memory_client_with(settings: ClientSettings) -> StoreClient {
    StoreClient::memory(settings)
}

/// Write `data` to `key`, declaring its size
pub async fn put(client: &dyn ObjectClient, key: &str, data: &[u8]) {
    let mut body = data;
    client
        .write(
            &Context::background(),
            key,
            &mut body,
            &WriteOptions::with_size(data.len() as u64),
        )
        .await
        .expect("write failed");
}

/// Read the whole object and release the reader
pub async fn read_all(client: &dyn ObjectClient, key: &str) -> Vec<u8> {
    let mut reader = client
        .read(&Context::background(), key)
        .await
        .expect("read failed");
    let mut out = Vec::new();
    reader.read_to_end(&mut out).await.expect("read_to_end failed");
    reader.close();
    out
}

/// Sorted keys of a listing
pub async fn list_keys(client: &dyn ObjectClient, prefix: &str) -> Vec<String> {
    let mut keys: Vec<String> = client
        .list(&Context::background(), prefix)
        .await
        .expect("list failed")
        .into_iter()
        .map(|item| item.key)
        .collect();
    keys.sort();
    keys
}
