//! The durable object store contract.

use async_trait::async_trait;

use crate::error::StorageResult;

/// Result of storing a binary payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Stable key usable for later reference (delete, re-sign).
    pub key: String,
    /// Retrievable locator for playback. The pipeline stores this on the
    /// video record without validating its content.
    pub url: String,
}

/// Durable store for uploaded binaries.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store a payload under `key` and return its locator.
    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<StoredObject>;

    /// Delete a stored object. Missing keys are a no-op.
    async fn delete(&self, key: &str) -> StorageResult<()>;
}

/// Build the object key for an upload: one namespace per tenant, a fresh
/// UUID so repeated uploads of the same filename never collide.
pub fn object_key(tenant_id: &str, filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("videohub/{}/{}-{}", tenant_id, uuid::Uuid::new_v4(), sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_namespaced_and_unique() {
        let a = object_key("t1", "my clip.mp4");
        let b = object_key("t1", "my clip.mp4");
        assert!(a.starts_with("videohub/t1/"));
        assert!(a.ends_with("my_clip.mp4"));
        assert_ne!(a, b);
    }
}
