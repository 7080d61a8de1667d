//! The registry client adapter.
//!
//! [`RegistryApi`] is the seam between the replication engine and a concrete
//! registry: every operation the engine needs (ping, catalog, tag listing,
//! manifest/blob pull and push, existence checks) goes through this trait.
//! [`HttpRegistryClient`] is the real implementation, backed by
//! [`crate::client::Client`]. The `testing` submodule provides an in-memory
//! double so the engine's state-machine logic can be exercised without a
//! live registry.

use crate::auth::Credentials;
use crate::client::Client;
use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

#[cfg(test)]
mod tests;

pub mod testing;

/// A stream of blob bytes, boxed so it can cross the trait boundary.
pub type BlobStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

/// The set of registry operations the replication engine depends on.
///
/// Mirrors the OCI Distribution Specification's read and write surface: a
/// `Ping` to confirm reachability, catalog/tag listing for discovery, and
/// manifest/blob pull, push, and existence checks for the actual transfer.
#[async_trait]
pub trait RegistryApi: Send + Sync {
    /// Confirms the registry is reachable and speaks the distribution API.
    async fn ping(&self) -> Result<()>;

    /// Lists every repository in the registry.
    async fn catalog(&self) -> Result<Vec<String>>;

    /// Lists every tag in a repository.
    async fn list_tags(&self, repository: &str) -> Result<Vec<String>>;

    /// Pulls a manifest by tag or digest, returning the raw payload, its
    /// media type, and its digest.
    async fn pull_manifest(&self, repository: &str, reference: &str) -> Result<(Vec<u8>, String, String)>;

    /// Looks up the manifest digest currently under `tag` on this registry.
    /// Returns `(digest, exists)`; `exists` is `false` (and `digest` empty)
    /// when the tag isn't present.
    async fn manifest_exists(&self, repository: &str, tag: &str) -> Result<(String, bool)>;

    /// Pushes a manifest under the given tag.
    async fn push_manifest(
        &self,
        repository: &str,
        reference: &str,
        media_type: &str,
        payload: &[u8],
    ) -> Result<()>;

    /// Returns whether a blob exists in the repository.
    async fn blob_exists(&self, repository: &str, digest: &str) -> Result<bool>;

    /// Pulls a blob as a stream of chunks, never buffering the whole body.
    async fn pull_blob(&self, repository: &str, digest: &str) -> Result<BlobStream>;

    /// Pushes a blob, streaming `body` through to the target without
    /// buffering it in memory. `size` lets the transport length-frame the
    /// upload.
    async fn push_blob(&self, repository: &str, digest: &str, size: u64, body: BlobStream) -> Result<()>;
}

/// The real [`RegistryApi`] implementation, backed by an HTTP client.
pub struct HttpRegistryClient {
    client: Client,
}

impl HttpRegistryClient {
    pub fn new(registry_url: &str, credentials: Option<Credentials>) -> Result<Self> {
        Ok(Self {
            client: Client::new(registry_url, credentials)?,
        })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RegistryApi for HttpRegistryClient {
    async fn ping(&self) -> Result<()> {
        self.client.ping().await.map(|_| ())
    }

    async fn catalog(&self) -> Result<Vec<String>> {
        self.client.fetch_catalog().await
    }

    async fn list_tags(&self, repository: &str) -> Result<Vec<String>> {
        self.client.fetch_tags(repository).await
    }

    async fn pull_manifest(&self, repository: &str, reference: &str) -> Result<(Vec<u8>, String, String)> {
        self.client.fetch_manifest(repository, reference).await
    }

    async fn manifest_exists(&self, repository: &str, tag: &str) -> Result<(String, bool)> {
        self.client.manifest_exists(repository, tag).await
    }

    async fn push_manifest(
        &self,
        repository: &str,
        reference: &str,
        media_type: &str,
        payload: &[u8],
    ) -> Result<()> {
        self.client
            .push_manifest(repository, reference, media_type, payload)
            .await
    }

    async fn blob_exists(&self, repository: &str, digest: &str) -> Result<bool> {
        self.client.blob_exists(repository, digest).await
    }

    async fn pull_blob(&self, repository: &str, digest: &str) -> Result<BlobStream> {
        use futures::TryStreamExt;
        let stream = self.client.pull_blob(repository, digest).await?;
        Ok(Box::pin(
            stream.map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e)),
        ))
    }

    async fn push_blob(&self, repository: &str, digest: &str, size: u64, body: BlobStream) -> Result<()> {
        self.client.push_blob(repository, digest, size, body).await
    }
}
