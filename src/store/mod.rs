//! Storage module
//!
//! Defines the `Store` trait and its two backends: one file per key on disk,
//! or a process-lifetime map in memory. This module knows nothing about HTTP.

mod error;
mod file;
mod memory;

pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tracing::info;

use crate::config::Backend;

/// A key-value store.
///
/// Implementations must be safe to call concurrently from many requests.
#[async_trait]
pub trait Store: Send + Sync {
    /// All keys currently stored. Empty store yields an empty vector.
    ///
    /// Ordering is backend specific: the memory backend sorts, the file
    /// backend returns directory order.
    async fn list(&self) -> StorageResult<Vec<String>>;

    /// Value for `key`, or `None` when the key was never written.
    async fn get(&self, key: &str) -> StorageResult<Option<Bytes>>;

    /// Create or fully replace the value for `key`.
    async fn put(&self, key: &str, value: Bytes) -> StorageResult<()>;
}

/// Open the backend selected in the configuration
pub fn open(backend: &Backend) -> StorageResult<Arc<dyn Store>> {
    match backend {
        Backend::File(dir) => {
            let store = FileStore::open(dir)?;
            info!("Using file store at {}", store.base_dir().display());
            Ok(Arc::new(store))
        }
        Backend::Memory => {
            info!("Using in-memory store, data will not survive a restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
