//! Object store backends

mod memory;
mod s3;
mod traits;


pub use memory::MemoryStore;
pub use s3::S3Store;
pub use traits::{ObjectMeta, ObjectStore, ObjectSummary, StoreError};
