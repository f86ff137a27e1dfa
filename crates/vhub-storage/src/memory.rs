//! In-memory object store for tests and local development.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StorageResult;
use crate::store::{ObjectStore, StoredObject};

/// Keeps payloads in a map and hands out synthetic locators.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a stored payload (test helper).
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.read().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<StoredObject> {
        self.objects.write().await.insert(key.to_string(), data);
        Ok(StoredObject {
            key: key.to_string(),
            url: format!("memory://{}", key),
        })
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.objects.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_get() {
        let store = MemoryObjectStore::new();
        let stored = store
            .put("videohub/t1/a.mp4", vec![1, 2, 3], "video/mp4")
            .await
            .unwrap();

        assert_eq!(stored.key, "videohub/t1/a.mp4");
        assert_eq!(stored.url, "memory://videohub/t1/a.mp4");
        assert_eq!(store.get("videohub/t1/a.mp4").await, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_delete_missing_is_noop() {
        let store = MemoryObjectStore::new();
        store.delete("nope").await.unwrap();
        assert_eq!(store.len().await, 0);
    }
}
