//! Core types for bucketfs
//!
//! This crate provides the construction-time configuration shared by the
//! signing and store crates.

pub mod config;

pub use config::{ConfigError, Credentials, StoreConfig};
