//! Filesystem emulation over the object client
//!
//! `BucketFs` maps path-oriented operations onto object-store primitives.
//! Paths are keys; directories and permission bits do not exist in the
//! store, so the calls that manipulate them are acknowledged without any
//! backend effect.

use crate::encoding::{DecodeError, Encoding};
use crate::store::{ObjectMeta, ObjectStore, StoreError};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};


/// Errors from filesystem-style operations
///
/// Every failure carries the operation name and the offending path(s).
/// No operation returns partial results or retries internally.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("{op} {path}: no such object")]
    NotFound { op: &'static str, path: String },

    #[error("{op} {path}: access denied")]
    PermissionDenied { op: &'static str, path: String },

    #[error("{op} {path}: {source}")]
    Store {
        op: &'static str,
        path: String,
        source: StoreError,
    },

    #[error("read {path}: {source}")]
    Decode { path: String, source: DecodeError },

    /// The trailing delete of a rename failed after the write succeeded,
    /// so both the old and the new object exist. The caller must re-check
    /// both paths before proceeding.
    #[error("rename {from} -> {to} incomplete, both paths may exist: {source}")]
    RenameIncomplete {
        from: String,
        to: String,
        source: StoreError,
    },
}

impl FsError {
    fn from_store(op: &'static str, path: &str, source: StoreError) -> Self {
        match source {
            StoreError::NotFound(_) => Self::NotFound {
                op,
                path: path.to_string(),
            },
            StoreError::PermissionDenied(_) => Self::PermissionDenied {
                op,
                path: path.to_string(),
            },
            source => Self::Store {
                op,
                path: path.to_string(),
                source,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Filesystem-style status record derived from object metadata
///
/// Valid only for the instant it was fetched; nothing is cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
    pub size: u64,
    pub modified: DateTime<Utc>,
}

impl From<ObjectMeta> for FileStat {
    fn from(meta: ObjectMeta) -> Self {
        Self {
            size: meta.size,
            modified: meta.last_modified,
        }
    }
}

/// Map a filesystem path to an object key
///
/// The mapping is the identity on the relative path string. Separator
/// characters are ordinary key bytes; no segment names a directory.
fn object_key(path: &str) -> &str {
    path
}

/// Map a listed key back to a directory-entry name
fn entry_name(key: String) -> String {
    key
}

/// Path-keyed operations over one bucket
///
/// Holds only the shared client handle; there is no other state and no
/// lock. Operations on different paths are fully independent, and
/// concurrent operations on the same path race at the store's
/// last-write-wins granularity — this layer adds no mutual exclusion.
#[derive(Clone)]
pub struct BucketFs {
    store: Arc<dyn ObjectStore>,
}

impl BucketFs {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Read an object's raw bytes
    pub async fn read(&self, path: &str) -> Result<Bytes, FsError> {
        self.store
            .get(object_key(path))
            .await
            .map_err(|e| FsError::from_store("read", path, e))
    }

    /// Read and decode as UTF-8 text
    pub async fn read_to_string(&self, path: &str) -> Result<String, FsError> {
        self.read_text(path, Encoding::Utf8).await
    }

    /// Read and decode with a declared encoding
    pub async fn read_text(&self, path: &str, encoding: Encoding) -> Result<String, FsError> {
        let data = self.read(path).await?;
        encoding.decode(&data).map_err(|source| FsError::Decode {
            path: path.to_string(),
            source,
        })
    }

    /// Write, unconditionally overwriting any object at this path
    ///
    /// There is no create-exclusive mode; the store's put is atomic per
    /// object, so no partial-write state exists.
    pub async fn write(&self, path: &str, contents: impl Into<Bytes>) -> Result<(), FsError> {
        self.store
            .put(object_key(path), contents.into())
            .await
            .map_err(|e| FsError::from_store("write", path, e))?;

        debug!(path, "wrote object");
        Ok(())
    }

    /// Delete; removing an absent path succeeds
    pub async fn remove_file(&self, path: &str) -> Result<(), FsError> {
        self.store
            .delete(object_key(path))
            .await
            .map_err(|e| FsError::from_store("remove", path, e))?;

        debug!(path, "removed object");
        Ok(())
    }

    /// Existence check
    ///
    /// Success means the object exists and is readable; the store exposes
    /// nothing finer, so existence and permission are conflated.
    pub async fn access(&self, path: &str) -> Result<(), FsError> {
        self.store
            .head(object_key(path))
            .await
            .map(|_| ())
            .map_err(|e| FsError::from_store("access", path, e))
    }

    /// Move content from one path to another
    ///
    /// Four independent store calls in strict order: existence check,
    /// read, write, delete. There is no atomicity, isolation or rollback
    /// across them. A failure before the write leaves the source intact;
    /// a failure of the trailing delete reports `RenameIncomplete` while
    /// both objects exist. After any rename failure the caller must
    /// re-check both paths rather than assume either state.
    pub async fn rename(&self, from: &str, to: &str) -> Result<(), FsError> {
        self.store
            .head(object_key(from))
            .await
            .map_err(|e| FsError::from_store("rename", from, e))?;

        let data = self
            .store
            .get(object_key(from))
            .await
            .map_err(|e| FsError::from_store("rename", from, e))?;

        self.store
            .put(object_key(to), data)
            .await
            .map_err(|e| FsError::from_store("rename", to, e))?;

        if let Err(source) = self.store.delete(object_key(from)).await {
            warn!(from, to, %source, "rename delete failed; both objects remain");
            return Err(FsError::RenameIncomplete {
                from: from.to_string(),
                to: to.to_string(),
                source,
            });
        }

        debug!(from, to, "renamed object");
        Ok(())
    }

    /// Enumerate every name in the bucket
    ///
    /// The sequence is flat; order is whatever the store returns.
    pub async fn read_dir(&self) -> Result<Vec<String>, FsError> {
        self.read_dir_with_prefix("").await
    }

    /// Enumerate names sharing a key prefix
    ///
    /// The prefix is a plain string match on keys, not a directory scope.
    pub async fn read_dir_with_prefix(&self, prefix: &str) -> Result<Vec<String>, FsError> {
        let entries = self
            .store
            .list(prefix)
            .await
            .map_err(|e| FsError::from_store("readdir", prefix, e))?;

        Ok(entries
            .into_iter()
            .map(|entry| entry_name(entry.key))
            .collect())
    }

    /// Status record for one path
    pub async fn stat(&self, path: &str) -> Result<FileStat, FsError> {
        self.store
            .head(object_key(path))
            .await
            .map(FileStat::from)
            .map_err(|e| FsError::from_store("stat", path, e))
    }

    /// Acknowledge a permission change
    ///
    /// The store has no permission bits; nothing is inspected or changed.
    pub async fn chmod(&self, path: &str, mode: u32) -> Result<(), FsError> {
        debug!(path, mode, "chmod acknowledged");
        Ok(())
    }

    /// Acknowledge a directory creation; no object is created
    pub async fn mkdir(&self, path: &str) -> Result<(), FsError> {
        debug!(path, "mkdir acknowledged");
        Ok(())
    }

    /// Acknowledge a directory removal; no object is inspected or removed
    pub async fn rmdir(&self, path: &str) -> Result<(), FsError> {
        debug!(path, "rmdir acknowledged");
        Ok(())
    }
}
