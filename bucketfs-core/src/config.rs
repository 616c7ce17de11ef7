//! Configuration management
//!
//! Everything here is fixed at construction time. The store client never
//! mutates or reloads its configuration.

use serde::Deserialize;
use std::env;
use thiserror::Error;

/// Errors while assembling configuration from the environment
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {var}: {value}")]
    InvalidVar { var: &'static str, value: String },
}

/// A fixed access key / secret key pair
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl Credentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }
}

/// Connection settings for one bucket on one endpoint
///
/// The bucket name is part of the configuration: every key the caller
/// supplies is resolved against this single bucket.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Endpoint base URL, e.g. `http://localhost:4566`
    pub endpoint: String,

    #[serde(default = "default_region")]
    pub region: String,

    pub bucket: String,

    pub credentials: Credentials,

    /// Address objects as `endpoint/bucket/key` instead of
    /// `bucket.endpoint/key`
    #[serde(default = "default_true")]
    pub force_path_style: bool,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_true() -> bool {
    true
}

fn default_endpoint() -> String {
    "http://localhost:4566".to_string()
}

impl StoreConfig {
    pub fn new(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            region: default_region(),
            bucket: bucket.into(),
            credentials,
            force_path_style: true,
        }
    }

    /// Load configuration from `BUCKETFS_*` environment variables
    ///
    /// `BUCKETFS_BUCKET` is required. Endpoint, region, credentials and
    /// addressing style fall back to local development defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bucket = env::var("BUCKETFS_BUCKET").map_err(|_| ConfigError::MissingVar("BUCKETFS_BUCKET"))?;

        let endpoint = env::var("BUCKETFS_ENDPOINT").unwrap_or_else(|_| default_endpoint());
        let region = env::var("BUCKETFS_REGION").unwrap_or_else(|_| default_region());

        let access_key_id =
            env::var("BUCKETFS_ACCESS_KEY_ID").unwrap_or_else(|_| "test".to_string());
        let secret_access_key =
            env::var("BUCKETFS_SECRET_ACCESS_KEY").unwrap_or_else(|_| "test".to_string());

        let force_path_style = match env::var("BUCKETFS_FORCE_PATH_STYLE") {
            Ok(value) => value.parse::<bool>().map_err(|_| ConfigError::InvalidVar {
                var: "BUCKETFS_FORCE_PATH_STYLE",
                value,
            })?,
            Err(_) => true,
        };

        Ok(Self {
            endpoint,
            region,
            bucket,
            credentials: Credentials::new(access_key_id, secret_access_key),
            force_path_style,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_construction_defaults() {
        let cfg = StoreConfig::new(
            "http://localhost:4566",
            "pages",
            Credentials::new("test", "test"),
        );

        assert_eq!(cfg.region, "us-east-1");
        assert!(cfg.force_path_style);
        assert_eq!(cfg.bucket, "pages");
    }

    #[test]
    fn test_from_env_requires_bucket() {
        env::remove_var("BUCKETFS_BUCKET");
        let result = StoreConfig::from_env();
        assert!(matches!(result, Err(ConfigError::MissingVar("BUCKETFS_BUCKET"))));
    }
}
