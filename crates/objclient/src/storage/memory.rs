//! In-memory backend for testing.

use object_store::memory::InMemory;
use std::sync::Arc;

use super::adapter::{BackendKind, StoreClient};
use crate::config::ClientSettings;

impl StoreClient {
    /// Client over a fresh in-process store.
    ///
    /// Nothing is persisted between runs. Writes do not need a size.
    pub fn memory(settings: ClientSettings) -> Self {
        Self::new(Arc::new(InMemory::new()), BackendKind::Memory, "memory", settings)
    }
}
