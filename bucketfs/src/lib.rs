//! Filesystem emulation over a flat object store
//!
//! bucketfs exposes a conventional filesystem contract — read, write,
//! delete, rename, stat, list, permission and directory calls — while the
//! backing storage is a flat, key-addressed object store reached over the
//! network. Callers written against a real filesystem need no awareness
//! of the substitution.

pub mod encoding;
pub mod fs;
pub mod store;

pub use encoding::Encoding;
pub use fs::{BucketFs, FileStat, FsError};
pub use store::{MemoryStore, ObjectStore, S3Store, StoreError};
