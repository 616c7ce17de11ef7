//! In-memory object store backend

use super::traits::{ObjectMeta, ObjectStore, ObjectSummary, StoreError};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use md5::{Digest, Md5};
use std::sync::atomic::{AtomicBool, Ordering};

/// In-memory stored object
struct MemoryObject {
    data: Bytes,
    etag: String,
    last_modified: DateTime<Utc>,
}

/// In-memory backend with the same observable semantics as the remote
/// store: last-write-wins puts, idempotent deletes, lexicographic listing.
///
/// Used by tests and local development. The delete fault switch injects
/// transport failures so composite-operation failure paths can be
/// exercised.
pub struct MemoryStore {
    objects: DashMap<String, MemoryObject>,
    fail_deletes: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            objects: DashMap::new(),
            fail_deletes: AtomicBool::new(false),
        }
    }

    /// Make every subsequent delete fail with a transport error
    pub fn fail_deletes(&self, enabled: bool) {
        self.fail_deletes.store(enabled, Ordering::SeqCst);
    }

    fn compute_etag(data: &[u8]) -> String {
        let mut hasher = Md5::new();
        hasher.update(data);
        format!("\"{}\"", hex::encode(hasher.finalize()))
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Bytes, StoreError> {
        let obj = self
            .objects
            .get(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;

        Ok(obj.data.clone())
    }

    async fn put(&self, key: &str, data: Bytes) -> Result<(), StoreError> {
        let etag = Self::compute_etag(&data);

        self.objects.insert(
            key.to_string(),
            MemoryObject {
                data,
                etag,
                last_modified: Utc::now(),
            },
        );

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StoreError::Transport(format!(
                "injected delete failure for {}",
                key
            )));
        }

        self.objects.remove(key);
        Ok(())
    }

    async fn head(&self, key: &str) -> Result<ObjectMeta, StoreError> {
        let obj = self
            .objects
            .get(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;

        Ok(ObjectMeta {
            size: obj.data.len() as u64,
            last_modified: obj.last_modified,
            etag: Some(obj.etag.clone()),
        })
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectSummary>, StoreError> {
        let mut entries: Vec<ObjectSummary> = self
            .objects
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| ObjectSummary {
                key: entry.key().clone(),
                size: entry.data.len() as u64,
                last_modified: entry.last_modified,
            })
            .collect();

        entries.sort_by(|a, b| a.key.cmp(&b.key));

        Ok(entries)
    }
}
