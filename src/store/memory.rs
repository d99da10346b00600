//! In-memory storage implementation

use super::{StorageResult, Store};
use async_trait::async_trait;
use bytes::Bytes;
use siphasher::sip::SipHasher13;
use std::collections::HashMap;
use std::hash::BuildHasherDefault;
use tokio::sync::RwLock;
use tracing::debug;

/// Type alias for our hash map with SipHasher
type StoreMap = HashMap<String, Bytes, BuildHasherDefault<SipHasher13>>;

/// In-memory key-value store
///
/// Everything lives in a single map guarded by a read/write lock. Nothing is
/// persisted: the contents are gone when the process exits.
pub struct MemoryStore {
    store: RwLock<StoreMap>,
}

impl MemoryStore {
    /// Create a new memory store with default capacity
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// Create a new memory store with specified initial capacity
    pub fn with_capacity(capacity: usize) -> Self {
        MemoryStore {
            store: RwLock::new(HashMap::with_capacity_and_hasher(
                capacity,
                BuildHasherDefault::<SipHasher13>::default(),
            )),
        }
    }

    /// Number of stored keys
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    /// Keys in ascending order. Copies and sorts on every call.
    async fn list(&self) -> StorageResult<Vec<String>> {
        let mut keys: Vec<String> = self.store.read().await.keys().cloned().collect();
        keys.sort_unstable();
        Ok(keys)
    }

    async fn get(&self, key: &str) -> StorageResult<Option<Bytes>> {
        Ok(self.store.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Bytes) -> StorageResult<()> {
        debug!("memory put {} ({} bytes)", key, value.len());
        self.store.write().await.insert(key.to_string(), value);
        Ok(())
    }
}
