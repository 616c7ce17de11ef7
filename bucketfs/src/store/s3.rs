//! HTTP object client
//!
//! Signed round-trips against an S3-compatible endpoint. One HTTP client
//! (and its connection pool) is created at construction and shared for the
//! lifetime of the store; no call is retried here.

use super::traits::{ObjectMeta, ObjectStore, ObjectSummary, StoreError};
use async_trait::async_trait;
use bucketfs_auth::{sha256_hex, sigv4, uri_encode, uri_encode_path, RequestSigner};
use bucketfs_core::{ConfigError, StoreConfig};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, CONTENT_LENGTH, ETAG, LAST_MODIFIED};
use reqwest::{Method, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;
use url::Url;

/// Object client over an S3-compatible HTTP API
pub struct S3Store {
    http: reqwest::Client,
    signer: RequestSigner,
    base: Url,
    bucket: String,
    force_path_style: bool,
}

impl S3Store {
    pub fn new(config: StoreConfig) -> Result<Self, ConfigError> {
        let base = Url::parse(&config.endpoint).map_err(|_| ConfigError::InvalidVar {
            var: "endpoint",
            value: config.endpoint.clone(),
        })?;

        Ok(Self {
            http: reqwest::Client::new(),
            signer: RequestSigner::new(config.credentials, config.region),
            base,
            bucket: config.bucket,
            force_path_style: config.force_path_style,
        })
    }

    /// Host header value, including the bucket for virtual-hosted
    /// addressing
    fn host(&self) -> String {
        let host = self.base.host_str().unwrap_or_default();
        let host = if self.force_path_style {
            host.to_string()
        } else {
            format!("{}.{}", self.bucket, host)
        };

        match self.base.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host,
        }
    }

    /// Canonical URI path for a key; an empty key addresses the bucket
    fn uri_path(&self, key: &str) -> String {
        if self.force_path_style {
            if key.is_empty() {
                format!("/{}", self.bucket)
            } else {
                format!("/{}/{}", self.bucket, uri_encode_path(key))
            }
        } else {
            format!("/{}", uri_encode_path(key))
        }
    }

    fn request_url(&self, path: &str, query: &str) -> String {
        let mut url = format!("{}://{}{}", self.base.scheme(), self.host(), path);
        if !query.is_empty() {
            url.push('?');
            url.push_str(query);
        }
        url
    }

    /// Sign and send one request
    async fn send(
        &self,
        method: Method,
        key: &str,
        query: &str,
        body: Option<Bytes>,
    ) -> Result<Response, StoreError> {
        let path = self.uri_path(key);
        let payload_hash = sha256_hex(body.as_deref().unwrap_or(&[]));
        let now = Utc::now();
        let amz_date = sigv4::format_amz_date(now);

        let headers = vec![
            ("host".to_string(), self.host()),
            ("x-amz-content-sha256".to_string(), payload_hash.clone()),
            ("x-amz-date".to_string(), amz_date.clone()),
        ];
        let signed_headers: Vec<String> = headers.iter().map(|(name, _)| name.clone()).collect();

        let authorization = self.signer.authorization_header(
            method.as_str(),
            &path,
            query,
            &headers,
            &signed_headers,
            &payload_hash,
            now,
        );

        let url = self.request_url(&path, query);
        debug!(%method, %url, "store request");

        let mut request = self
            .http
            .request(method, &url)
            .header("x-amz-date", amz_date)
            .header("x-amz-content-sha256", payload_hash)
            .header("authorization", authorization);

        if let Some(body) = body {
            request = request.body(body);
        }

        Ok(request.send().await?)
    }
}

/// S3 XML error body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorResponse {
    code: String,
}

/// ListObjectsV2 response body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListBucketResult {
    #[serde(default)]
    is_truncated: bool,
    next_continuation_token: Option<String>,
    #[serde(default)]
    contents: Vec<ListEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListEntry {
    key: String,
    last_modified: String,
    #[serde(default)]
    size: u64,
}

/// Classify a non-success response, consuming its body
async fn error_for(key: &str, response: Response) -> StoreError {
    let status = response.status();

    match status {
        StatusCode::NOT_FOUND => StoreError::NotFound(key.to_string()),
        StatusCode::FORBIDDEN => StoreError::PermissionDenied(key.to_string()),
        _ => {
            let body = response.text().await.unwrap_or_default();
            let code = quick_xml::de::from_str::<ErrorResponse>(&body)
                .map(|e| e.code)
                .unwrap_or_else(|_| {
                    status.canonical_reason().unwrap_or("unknown").to_string()
                });

            StoreError::Api {
                key: key.to_string(),
                status: status.as_u16(),
                code,
            }
        }
    }
}

/// Classify a non-success response on status alone (HEAD has no body)
fn error_for_status(key: &str, status: StatusCode) -> StoreError {
    match status {
        StatusCode::NOT_FOUND => StoreError::NotFound(key.to_string()),
        StatusCode::FORBIDDEN => StoreError::PermissionDenied(key.to_string()),
        _ => StoreError::Api {
            key: key.to_string(),
            status: status.as_u16(),
            code: status.canonical_reason().unwrap_or("unknown").to_string(),
        },
    }
}

fn meta_from_headers(key: &str, headers: &HeaderMap) -> Result<ObjectMeta, StoreError> {
    let size = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .ok_or_else(|| StoreError::Decode(format!("missing content length for {}", key)))?;

    let raw = headers
        .get(LAST_MODIFIED)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| StoreError::Decode(format!("missing last-modified for {}", key)))?;
    let last_modified = DateTime::parse_from_rfc2822(raw)
        .map_err(|e| StoreError::Decode(format!("last-modified for {}: {}", key, e)))?
        .with_timezone(&Utc);

    let etag = headers
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    Ok(ObjectMeta {
        size,
        last_modified,
        etag,
    })
}

fn parse_list_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Decode(format!("timestamp {}: {}", raw, e)))
}

/// Canonical ListObjectsV2 query string, parameters sorted by name
fn list_query(prefix: &str, continuation: Option<&str>) -> String {
    let mut params = vec![("list-type".to_string(), "2".to_string())];

    if let Some(token) = continuation {
        params.push(("continuation-token".to_string(), uri_encode(token)));
    }
    if !prefix.is_empty() {
        params.push(("prefix".to_string(), uri_encode(prefix)));
    }

    params.sort();
    params
        .into_iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("&")
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn get(&self, key: &str) -> Result<Bytes, StoreError> {
        let response = self.send(Method::GET, key, "", None).await?;

        if !response.status().is_success() {
            return Err(error_for(key, response).await);
        }

        Ok(response.bytes().await?)
    }

    async fn put(&self, key: &str, data: Bytes) -> Result<(), StoreError> {
        let response = self.send(Method::PUT, key, "", Some(data)).await?;

        if !response.status().is_success() {
            return Err(error_for(key, response).await);
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let response = self.send(Method::DELETE, key, "", None).await?;

        if response.status().is_success() {
            return Ok(());
        }

        // Some stores answer 404 instead of 204 for an absent key; the
        // contract is idempotent either way.
        match error_for(key, response).await {
            StoreError::NotFound(_) => Ok(()),
            err => Err(err),
        }
    }

    async fn head(&self, key: &str) -> Result<ObjectMeta, StoreError> {
        let response = self.send(Method::HEAD, key, "", None).await?;

        if !response.status().is_success() {
            return Err(error_for_status(key, response.status()));
        }

        meta_from_headers(key, response.headers())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectSummary>, StoreError> {
        let mut entries = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let query = list_query(prefix, continuation.as_deref());
            let response = self.send(Method::GET, "", &query, None).await?;

            if !response.status().is_success() {
                return Err(error_for(prefix, response).await);
            }

            let body = response.text().await?;
            let page: ListBucketResult = quick_xml::de::from_str(&body)
                .map_err(|e| StoreError::Decode(format!("list response: {}", e)))?;

            for entry in page.contents {
                entries.push(ObjectSummary {
                    key: entry.key,
                    size: entry.size,
                    last_modified: parse_list_timestamp(&entry.last_modified)?,
                });
            }

            match page.next_continuation_token {
                Some(token) if page.is_truncated => continuation = Some(token),
                _ => break,
            }
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bucketfs_core::Credentials;

    fn store(force_path_style: bool) -> S3Store {
        let mut config = StoreConfig::new(
            "http://localhost:4566",
            "pages",
            Credentials::new("test", "test"),
        );
        config.force_path_style = force_path_style;
        S3Store::new(config).unwrap()
    }

    #[test]
    fn test_path_style_addressing() {
        let s = store(true);

        assert_eq!(s.host(), "localhost:4566");
        assert_eq!(s.uri_path("bundle/index.html"), "/pages/bundle/index.html");
        assert_eq!(s.uri_path(""), "/pages");
        assert_eq!(
            s.request_url("/pages/a.txt", "list-type=2"),
            "http://localhost:4566/pages/a.txt?list-type=2"
        );
    }

    #[test]
    fn test_virtual_hosted_addressing() {
        let s = store(false);

        assert_eq!(s.host(), "pages.localhost:4566");
        assert_eq!(s.uri_path("bundle/index.html"), "/bundle/index.html");
        assert_eq!(s.uri_path(""), "/");
    }

    #[test]
    fn test_key_encoding_in_uri() {
        let s = store(true);

        assert_eq!(
            s.uri_path("reports/q1 final.html"),
            "/pages/reports/q1%20final.html"
        );
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let config = StoreConfig::new("not a url", "pages", Credentials::new("test", "test"));
        assert!(matches!(
            S3Store::new(config),
            Err(ConfigError::InvalidVar { var: "endpoint", .. })
        ));
    }

    #[test]
    fn test_list_query_sorted_and_encoded() {
        assert_eq!(list_query("", None), "list-type=2");
        assert_eq!(list_query("pages/", None), "list-type=2&prefix=pages%2F");
        assert_eq!(
            list_query("p", Some("tok==")),
            "continuation-token=tok%3D%3D&list-type=2&prefix=p"
        );
    }

    #[test]
    fn test_parse_list_response() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Name>pages</Name>
  <Prefix/>
  <KeyCount>2</KeyCount>
  <IsTruncated>true</IsTruncated>
  <NextContinuationToken>abc123</NextContinuationToken>
  <Contents>
    <Key>manifest.json</Key>
    <LastModified>2024-01-02T03:04:05.000Z</LastModified>
    <ETag>&quot;9a0364b9e99bb480dd25e1f0284c8555&quot;</ETag>
    <Size>42</Size>
    <StorageClass>STANDARD</StorageClass>
  </Contents>
  <Contents>
    <Key>pages/index.html</Key>
    <LastModified>2024-01-02T03:04:06.000Z</LastModified>
    <Size>1024</Size>
  </Contents>
</ListBucketResult>"#;

        let result: ListBucketResult = quick_xml::de::from_str(body).unwrap();

        assert!(result.is_truncated);
        assert_eq!(result.next_continuation_token.as_deref(), Some("abc123"));
        assert_eq!(result.contents.len(), 2);
        assert_eq!(result.contents[0].key, "manifest.json");
        assert_eq!(result.contents[0].size, 42);
        assert_eq!(result.contents[1].key, "pages/index.html");
    }

    #[test]
    fn test_parse_empty_list_response() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Name>pages</Name>
  <KeyCount>0</KeyCount>
  <IsTruncated>false</IsTruncated>
</ListBucketResult>"#;

        let result: ListBucketResult = quick_xml::de::from_str(body).unwrap();

        assert!(!result.is_truncated);
        assert!(result.contents.is_empty());
        assert!(result.next_continuation_token.is_none());
    }

    #[test]
    fn test_parse_error_response() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error>
  <Code>SlowDown</Code>
  <Message>Please reduce your request rate.</Message>
  <RequestId>4442587FB7D0A2F9</RequestId>
</Error>"#;

        let parsed: ErrorResponse = quick_xml::de::from_str(body).unwrap();
        assert_eq!(parsed.code, "SlowDown");
    }

    #[test]
    fn test_meta_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_LENGTH, "42".parse().unwrap());
        headers.insert(
            LAST_MODIFIED,
            "Tue, 02 Jan 2024 03:04:05 GMT".parse().unwrap(),
        );
        headers.insert(ETAG, "\"abc\"".parse().unwrap());

        let meta = meta_from_headers("key", &headers).unwrap();

        assert_eq!(meta.size, 42);
        assert_eq!(meta.etag.as_deref(), Some("\"abc\""));
        assert_eq!(
            meta.last_modified,
            DateTime::parse_from_rfc2822("Tue, 02 Jan 2024 03:04:05 GMT").unwrap()
        );
    }

    #[test]
    fn test_meta_missing_length_is_decode_error() {
        let headers = HeaderMap::new();
        let result = meta_from_headers("key", &headers);
        assert!(matches!(result, Err(StoreError::Decode(_))));
    }

    #[test]
    fn test_list_timestamp_parse() {
        let t = parse_list_timestamp("2024-01-02T03:04:05.000Z").unwrap();
        assert_eq!(t.timestamp(), 1_704_164_645);

        assert!(parse_list_timestamp("yesterday").is_err());
    }
}
