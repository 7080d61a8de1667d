//! HTTP client for OCI registry communication.
//!
//! This module provides a thin, fully async HTTP client built on reqwest for
//! interacting with OCI-compliant container registries. It implements just
//! enough of the OCI Distribution Specification v2 API for replication: pull
//! and push of manifests and blobs, catalog/tag listing, and existence
//! checks used to skip redundant transfers.

use crate::digest::Digest;
use crate::error::{Result, SyncError};
use bytes::Bytes;
use futures::Stream;
use reqwest::{Client as ReqwestClient, Response, StatusCode};
use serde::Deserialize;
use sha2::{Digest as Sha2Digest, Sha256};
use std::str::FromStr;
use std::time::Duration;

#[cfg(test)]
mod tests;

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    repositories: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    name: String,
    tags: Vec<String>,
}

/// Version information returned by the registry's `/v2/` ping endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryVersion {
    /// The Docker-Distribution-API-Version header value, if present.
    pub api_version: Option<String>,
}

/// Configuration for the HTTP client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout in seconds (default: 30). Blob transfers are exempt
    /// from this (see [`Client::pull_blob`]/[`Client::push_blob`]) since a
    /// large layer can legitimately take longer than a metadata call.
    pub timeout_seconds: u64,
    /// Maximum idle connections per host (default: 10).
    pub max_idle_per_host: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            max_idle_per_host: 10,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_max_idle_per_host(mut self, max: usize) -> Self {
        self.max_idle_per_host = max;
        self
    }
}

/// Async HTTP client for OCI registry operations against a single registry.
#[derive(Debug, Clone)]
pub struct Client {
    http_client: ReqwestClient,
    registry_url: String,
    credentials: Option<crate::auth::Credentials>,
}

impl Client {
    pub fn new(registry_url: &str, credentials: Option<crate::auth::Credentials>) -> Result<Self> {
        Self::with_config(registry_url, ClientConfig::default(), credentials)
    }

    pub fn with_config(
        registry_url: &str,
        config: ClientConfig,
        credentials: Option<crate::auth::Credentials>,
    ) -> Result<Self> {
        let normalized_url = Self::normalize_url(registry_url)?;

        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .pool_max_idle_per_host(config.max_idle_per_host)
            .build()
            .map_err(|e| SyncError::network_with_source("failed to create HTTP client", e))?;

        Ok(Self {
            http_client,
            registry_url: normalized_url,
            credentials,
        })
    }

    fn normalize_url(url: &str) -> Result<String> {
        let url = url.trim();
        if url.is_empty() {
            return Err(SyncError::validation("registry URL cannot be empty"));
        }
        let url = if !url.starts_with("http://") && !url.starts_with("https://") {
            format!("http://{}", url)
        } else {
            url.to_string()
        };
        Ok(url.trim_end_matches('/').to_string())
    }

    pub fn registry_url(&self) -> &str {
        &self.registry_url
    }

    fn authorize(&self, mut request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(ref creds) = self.credentials
            && let Some(header) = creds.to_header_value()
        {
            request = request.header("Authorization", header);
        }
        request
    }

    /// `GET /v2/` — verifies the registry speaks the distribution API.
    pub async fn ping(&self) -> Result<RegistryVersion> {
        let url = format!("{}/v2/", self.registry_url);
        let request = self.authorize(self.http_client.get(&url));
        let response = request
            .send()
            .await
            .map_err(|e| Self::translate_reqwest_error(e, &self.registry_url))?;

        let api_version = response
            .headers()
            .get("Docker-Distribution-API-Version")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        Self::check_response_status(response).await?;
        Ok(RegistryVersion { api_version })
    }

    /// `GET /v2/_catalog`, following `Link` pagination to completion.
    pub async fn fetch_catalog(&self) -> Result<Vec<String>> {
        let mut all = Vec::new();
        let mut url = format!("{}/v2/_catalog", self.registry_url);

        loop {
            let request = self.authorize(self.http_client.get(&url));
            let response = request
                .send()
                .await
                .map_err(|e| Self::translate_reqwest_error(e, &self.registry_url))?;

            let next_path = Self::extract_next_link(response.headers());
            let response = Self::check_response_status(response).await?;

            let catalog: CatalogResponse = response
                .json()
                .await
                .map_err(|e| SyncError::validation_with_source("failed to parse catalog response", e))?;
            all.extend(catalog.repositories);

            match next_path {
                Some(path) => url = format!("{}{}", self.registry_url, path),
                None => break,
            }
        }

        Ok(all)
    }

    /// `GET /v2/<name>/tags/list`, following `Link` pagination to completion.
    pub async fn fetch_tags(&self, repository: &str) -> Result<Vec<String>> {
        let mut all = Vec::new();
        let mut url = format!("{}/v2/{}/tags/list", self.registry_url, repository);

        loop {
            let request = self.authorize(self.http_client.get(&url));
            let response = request
                .send()
                .await
                .map_err(|e| Self::translate_reqwest_error(e, &self.registry_url))?;

            let next_path = Self::extract_next_link(response.headers());
            let response = Self::check_response_status(response).await?;

            let tags: TagsResponse = response
                .json()
                .await
                .map_err(|e| SyncError::validation_with_source("failed to parse tags response", e))?;
            if tags.name != repository {
                return Err(SyncError::validation(format!(
                    "registry returned tags for '{}' but expected '{}'",
                    tags.name, repository
                )));
            }
            all.extend(tags.tags);

            match next_path {
                Some(path) => url = format!("{}{}", self.registry_url, path),
                None => break,
            }
        }

        Ok(all)
    }

    /// `GET /v2/<name>/manifests/<reference>`. Returns the raw manifest bytes,
    /// the media type from the `Content-Type` header, and the digest (from
    /// `Docker-Content-Digest` or, failing that, computed from the bytes).
    pub async fn fetch_manifest(
        &self,
        repository: &str,
        reference: &str,
    ) -> Result<(Vec<u8>, String, String)> {
        let url = format!(
            "{}/v2/{}/manifests/{}",
            self.registry_url, repository, reference
        );

        let request = self.authorize(self.http_client.get(&url)).header(
            "Accept",
            "application/vnd.docker.distribution.manifest.v2+json, \
             application/vnd.docker.distribution.manifest.v1+json",
        );

        let response = request
            .send()
            .await
            .map_err(|e| Self::translate_reqwest_error(e, &self.registry_url))?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/vnd.docker.distribution.manifest.v1+json")
            .to_string();
        let digest_from_header = response
            .headers()
            .get("Docker-Content-Digest")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let response = Self::check_response_status(response).await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SyncError::network_with_source("failed to read manifest response", e))?;

        let digest = digest_from_header.unwrap_or_else(|| {
            let mut hasher = Sha256::new();
            hasher.update(&bytes);
            format!("sha256:{:x}", hasher.finalize())
        });

        Ok((bytes.to_vec(), content_type, digest))
    }

    /// `PUT /v2/<name>/manifests/<reference>`.
    pub async fn push_manifest(
        &self,
        repository: &str,
        reference: &str,
        media_type: &str,
        payload: &[u8],
    ) -> Result<()> {
        let url = format!(
            "{}/v2/{}/manifests/{}",
            self.registry_url, repository, reference
        );

        let request = self
            .authorize(self.http_client.put(&url))
            .header(reqwest::header::CONTENT_TYPE, media_type)
            .body(payload.to_vec());

        let response = request
            .send()
            .await
            .map_err(|e| Self::translate_reqwest_error(e, &self.registry_url))?;
        Self::check_response_status(response).await?;
        Ok(())
    }

    /// `HEAD /v2/<name>/manifests/<reference>`. Returns `(digest, exists)`;
    /// `exists` is `false` (and `digest` empty) on a plain 404.
    pub async fn manifest_exists(&self, repository: &str, reference: &str) -> Result<(String, bool)> {
        let url = format!(
            "{}/v2/{}/manifests/{}",
            self.registry_url, repository, reference
        );
        let request = self.authorize(self.http_client.head(&url));
        let response = request
            .send()
            .await
            .map_err(|e| Self::translate_reqwest_error(e, &self.registry_url))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok((String::new(), false));
        }

        let digest = response
            .headers()
            .get("Docker-Content-Digest")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .unwrap_or_default();

        Self::check_response_status(response).await?;
        Ok((digest, true))
    }

    /// `HEAD /v2/<name>/blobs/<digest>`. `Ok(false)` on a plain 404.
    pub async fn blob_exists(&self, repository: &str, digest: &str) -> Result<bool> {
        let url = format!("{}/v2/{}/blobs/{}", self.registry_url, repository, digest);
        let request = self.authorize(self.http_client.head(&url));
        let response = request
            .send()
            .await
            .map_err(|e| Self::translate_reqwest_error(e, &self.registry_url))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Self::check_response_status(response).await?;
        Ok(true)
    }

    /// `GET /v2/<name>/blobs/<digest>`, returning a byte stream rather than a
    /// buffered `Vec` so a large layer never has to fit in memory whole.
    /// Callers are responsible for verifying the digest against what they
    /// actually write (see the blob-transfer sync module).
    pub async fn pull_blob(
        &self,
        repository: &str,
        digest: &str,
    ) -> Result<impl Stream<Item = reqwest::Result<Bytes>> + use<>> {
        Digest::from_str(digest)?;
        let url = format!("{}/v2/{}/blobs/{}", self.registry_url, repository, digest);
        let request = self.authorize(self.http_client.get(&url));
        let response = request
            .send()
            .await
            .map_err(|e| Self::translate_reqwest_error(e, &self.registry_url))?;
        let response = Self::check_response_status(response).await?;
        Ok(response.bytes_stream())
    }

    /// `POST` to start an upload, then `PUT` the blob as a streamed body to
    /// the location returned, never buffering it in memory. Registries that
    /// require chunked uploads for large blobs are out of scope; this issues
    /// a single monolithic push with `size` framing the `Content-Length`.
    pub async fn push_blob(
        &self,
        repository: &str,
        digest: &str,
        size: u64,
        body: impl Stream<Item = std::io::Result<Bytes>> + Send + 'static,
    ) -> Result<()> {
        let start_url = format!("{}/v2/{}/blobs/uploads/", self.registry_url, repository);
        let request = self.authorize(self.http_client.post(&start_url));
        let response = request
            .send()
            .await
            .map_err(|e| Self::translate_reqwest_error(e, &self.registry_url))?;

        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let response = Self::check_response_status(response).await?;
        let location = location.ok_or_else(|| {
            SyncError::server(
                "blob upload initiation did not return a Location header".to_string(),
                response.status().as_u16(),
            )
        })?;

        let upload_url = if location.starts_with("http://") || location.starts_with("https://") {
            location
        } else {
            format!("{}{}", self.registry_url, location)
        };
        let separator = if upload_url.contains('?') { "&" } else { "?" };
        let put_url = format!("{}{}digest={}", upload_url, separator, digest);

        let request = self
            .authorize(self.http_client.put(&put_url))
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .header(reqwest::header::CONTENT_LENGTH, size)
            .body(reqwest::Body::wrap_stream(body));
        let response = request
            .send()
            .await
            .map_err(|e| Self::translate_reqwest_error(e, &self.registry_url))?;
        Self::check_response_status(response).await?;
        Ok(())
    }

    fn extract_next_link(headers: &reqwest::header::HeaderMap) -> Option<String> {
        let link_str = headers.get(reqwest::header::LINK)?.to_str().ok()?;
        for link_part in link_str.split(',') {
            let link_part = link_part.trim();
            if link_part.contains("rel=\"next\"") || link_part.contains("rel='next'") {
                if let (Some(start), Some(end)) = (link_part.find('<'), link_part.find('>')) {
                    return Some(link_part[start + 1..end].to_string());
                }
            }
        }
        None
    }

    fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
        let retry_str = headers.get(reqwest::header::RETRY_AFTER)?.to_str().ok()?;

        if let Ok(seconds) = retry_str.parse::<u64>() {
            return Some(seconds);
        }

        if let Ok(datetime) = httpdate::parse_http_date(retry_str) {
            let now = std::time::SystemTime::now();
            if datetime > now {
                if let Ok(duration) = datetime.duration_since(now) {
                    return Some(duration.as_secs());
                }
            } else {
                return Some(0);
            }
        }

        None
    }

    fn translate_reqwest_error(error: reqwest::Error, registry_url: &str) -> SyncError {
        if error.is_timeout() {
            SyncError::network(format!("request to {} timed out", registry_url))
        } else if error.is_connect() {
            SyncError::network_with_source(
                format!("failed to connect to registry at {}", registry_url),
                error,
            )
        } else if error.is_request() {
            SyncError::network_with_source(format!("failed to send request to {}", registry_url), error)
        } else {
            SyncError::network_with_source(
                format!("network error communicating with {}", registry_url),
                error,
            )
        }
    }

    async fn check_response_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let headers = response.headers().clone();
        let url = response.url().to_string();
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("(unable to read response body)"));

        match status {
            StatusCode::UNAUTHORIZED => Err(SyncError::authentication(
                format!("authentication required for {}: {}", url, error_body),
                Some(401),
            )),
            StatusCode::FORBIDDEN => Err(SyncError::authentication(
                format!("access forbidden for {}: {}", url, error_body),
                Some(403),
            )),
            StatusCode::NOT_FOUND => Err(SyncError::not_found("endpoint", &url)),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = Self::parse_retry_after(&headers);
                Err(SyncError::rate_limit(
                    format!("rate limit exceeded for {}", url),
                    retry_after,
                ))
            }
            StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT => Err(SyncError::server(
                format!("server error from {}: {}", url, error_body),
                status.as_u16(),
            )),
            _ => Err(SyncError::network(format!(
                "HTTP {} from {}: {}",
                status.as_u16(),
                url,
                error_body
            ))),
        }
    }
}
