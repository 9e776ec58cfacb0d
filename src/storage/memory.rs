//! In-memory content store
//!
//! Content is addressed by its SHA-256 digest (hex). Useful for dry runs
//! and tests; nothing leaves the process.

use std::collections::HashMap;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use crate::domain::{AttachedFile, StoredFile, IPFS_SCHEME};
use crate::infra::{ContentStore, StorageError};

const DEFAULT_GATEWAY: &str = "memory://";

/// Content-addressed store held in a map
pub struct MemoryContentStore {
    gateway: String,
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::with_gateway(DEFAULT_GATEWAY)
    }

    pub fn with_gateway(gateway: impl Into<String>) -> Self {
        Self {
            gateway: gateway.into(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Identifier for `bytes`
    pub fn content_id(bytes: &[u8]) -> String {
        hex::encode(Sha256::digest(bytes))
    }

    pub async fn get(&self, cid: &str) -> Option<Vec<u8>> {
        self.objects.read().await.get(cid).cloned()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    async fn put(&self, bytes: Vec<u8>) -> String {
        let cid = Self::content_id(&bytes);
        self.objects.write().await.insert(cid.clone(), bytes);
        cid
    }
}

impl Default for MemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn upload_file(&self, file: &AttachedFile) -> Result<StoredFile, StorageError> {
        let cid = self.put(file.bytes.clone()).await;
        Ok(StoredFile {
            url: format!("{}{}", self.gateway, cid),
            cid,
        })
    }

    async fn upload_json(
        &self,
        _name: &str,
        document: &serde_json::Value,
    ) -> Result<String, StorageError> {
        let bytes = serde_json::to_vec(document)?;
        let cid = self.put(bytes).await;
        Ok(format!("{IPFS_SCHEME}{cid}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_identical_content_shares_identifier() {
        let store = MemoryContentStore::new();
        let a = AttachedFile::new("a.txt", "text/plain", b"same".to_vec());
        let b = AttachedFile::new("b.txt", "text/plain", b"same".to_vec());

        let first = store.upload_file(&a).await.unwrap();
        let second = store.upload_file(&b).await.unwrap();

        assert_eq!(first.cid, second.cid);
        assert_eq!(store.len().await, 1);
        assert_eq!(first.url, format!("memory://{}", first.cid));
    }

    #[tokio::test]
    async fn test_json_returns_scheme_uri_and_is_retrievable() {
        let store = MemoryContentStore::new();
        let doc = serde_json::json!({ "title": "Proof" });

        let uri = store.upload_json("proof.json", &doc).await.unwrap();
        let cid = uri.strip_prefix("ipfs://").unwrap();

        let stored = store.get(cid).await.unwrap();
        let back: serde_json::Value = serde_json::from_slice(&stored).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_content_id_is_sha256_hex() {
        assert_eq!(
            MemoryContentStore::content_id(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
