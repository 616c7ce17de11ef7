//! Object client contract

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors from object-store calls
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("access denied: {0}")]
    PermissionDenied(String),

    #[error("store returned {status} for {key}: {code}")]
    Api { key: String, status: u16, code: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid store response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Metadata returned by a head call
#[derive(Debug, Clone)]
pub struct ObjectMeta {
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub etag: Option<String>,
}

/// One entry in a listing
#[derive(Debug, Clone)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

/// Abstract object client
///
/// One instance is bound to one bucket for its lifetime; every call is a
/// single network round-trip with no retry and no cross-call state.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch an object's full content
    async fn get(&self, key: &str) -> Result<Bytes, StoreError>;

    /// Store an object, overwriting any existing one at this key
    async fn put(&self, key: &str, data: Bytes) -> Result<(), StoreError>;

    /// Delete an object; deleting an absent key succeeds
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Fetch an object's metadata without its content
    async fn head(&self, key: &str) -> Result<ObjectMeta, StoreError>;

    /// Enumerate keys under a prefix; `""` lists the whole bucket
    ///
    /// The result is finite and complete. Order is whatever the store
    /// returns, typically lexicographic by key.
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectSummary>, StoreError>;
}
