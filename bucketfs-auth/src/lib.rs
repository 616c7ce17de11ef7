//! Request authentication for bucketfs
//!
//! Implements AWS Signature Version 4 signing for outgoing object-store
//! requests.

pub mod sigv4;

pub use sigv4::{sha256_hex, uri_encode, uri_encode_path, RequestSigner};
