//! An in-memory [`RegistryApi`] double for exercising the replication engine
//! without a live registry.
//!
//! Construct one [`FakeRegistry`] per side of a replication (source and
//! target), seed it with [`FakeRegistry::seed_manifest`] /
//! [`FakeRegistry::seed_blob`], then drive it through [`super::RegistryApi`]
//! the same way the engine does. [`FakeRegistry::set_unreachable`] and
//! [`FakeRegistry::fail_blob`] let a test inject the failures the engine is
//! expected to surface as tag-level errors.

use super::{BlobStream, RegistryApi};
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use futures::{stream, StreamExt};
use sha2::{Digest as Sha2Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct RepoState {
    /// tag -> manifest digest
    tags: HashMap<String, String>,
    /// manifest digest -> (media type, payload)
    manifests: HashMap<String, (String, Vec<u8>)>,
    /// blob digest -> content
    blobs: HashMap<String, Vec<u8>>,
}

#[derive(Default)]
struct State {
    repos: HashMap<String, RepoState>,
    unreachable: bool,
    failing_blobs: std::collections::HashSet<String>,
}

/// An in-memory registry double implementing [`RegistryApi`].
pub struct FakeRegistry {
    state: Mutex<State>,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    /// Marks the registry as unreachable: `ping` and `catalog` will error.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().unwrap().unreachable = unreachable;
    }

    /// Makes `pull_blob`/`blob_exists`/`push_blob` error for this digest,
    /// simulating a registry-side failure mid-transfer.
    pub fn fail_blob(&self, digest: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_blobs
            .insert(digest.to_string());
    }

    /// Seeds a manifest under `repository:tag`, computing its digest from
    /// the payload. Returns the digest so the caller can assert on it.
    pub fn seed_manifest(
        &self,
        repository: &str,
        tag: &str,
        media_type: &str,
        payload: Vec<u8>,
    ) -> String {
        let digest = digest_of(&payload);
        let mut state = self.state.lock().unwrap();
        let repo = state.repos.entry(repository.to_string()).or_default();
        repo.manifests
            .insert(digest.clone(), (media_type.to_string(), payload));
        repo.tags.insert(tag.to_string(), digest.clone());
        digest
    }

    /// Seeds a blob by its exact digest (not recomputed) so a test can seed
    /// a deliberately mismatched digest if needed.
    pub fn seed_blob(&self, repository: &str, digest: &str, content: Vec<u8>) {
        let mut state = self.state.lock().unwrap();
        state
            .repos
            .entry(repository.to_string())
            .or_default()
            .blobs
            .insert(digest.to_string(), content);
    }

    /// Returns the manifest digest currently tagged, if any.
    pub fn tagged_digest(&self, repository: &str, tag: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .repos
            .get(repository)
            .and_then(|r| r.tags.get(tag).cloned())
    }

    /// Returns whether a blob is present in a repository.
    pub fn has_blob(&self, repository: &str, digest: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .repos
            .get(repository)
            .map(|r| r.blobs.contains_key(digest))
            .unwrap_or(false)
    }
}

impl Default for FakeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn digest_of(payload: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload);
    format!("sha256:{:x}", hasher.finalize())
}

#[async_trait]
impl RegistryApi for FakeRegistry {
    async fn ping(&self) -> Result<()> {
        if self.state.lock().unwrap().unreachable {
            return Err(SyncError::network("fake registry is unreachable"));
        }
        Ok(())
    }

    async fn catalog(&self) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        if state.unreachable {
            return Err(SyncError::network("fake registry is unreachable"));
        }
        let mut names: Vec<String> = state.repos.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn list_tags(&self, repository: &str) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        let repo = state
            .repos
            .get(repository)
            .ok_or_else(|| SyncError::not_found("repository", repository))?;
        let mut tags: Vec<String> = repo.tags.keys().cloned().collect();
        tags.sort();
        Ok(tags)
    }

    async fn pull_manifest(
        &self,
        repository: &str,
        reference: &str,
    ) -> Result<(Vec<u8>, String, String)> {
        let state = self.state.lock().unwrap();
        let repo = state
            .repos
            .get(repository)
            .ok_or_else(|| SyncError::not_found("repository", repository))?;

        let digest = if reference.starts_with("sha256:") {
            reference.to_string()
        } else {
            repo.tags
                .get(reference)
                .cloned()
                .ok_or_else(|| SyncError::not_found("tag", reference))?
        };
        let (media_type, payload) = repo
            .manifests
            .get(&digest)
            .cloned()
            .ok_or_else(|| SyncError::not_found("manifest", &digest))?;
        Ok((payload, media_type, digest))
    }

    async fn manifest_exists(&self, repository: &str, tag: &str) -> Result<(String, bool)> {
        let state = self.state.lock().unwrap();
        let digest = state
            .repos
            .get(repository)
            .and_then(|r| r.tags.get(tag).cloned());
        Ok(match digest {
            Some(digest) => (digest, true),
            None => (String::new(), false),
        })
    }

    async fn push_manifest(
        &self,
        repository: &str,
        reference: &str,
        media_type: &str,
        payload: &[u8],
    ) -> Result<()> {
        let digest = digest_of(payload);
        let mut state = self.state.lock().unwrap();
        let repo = state.repos.entry(repository.to_string()).or_default();
        repo.manifests
            .insert(digest.clone(), (media_type.to_string(), payload.to_vec()));
        repo.tags.insert(reference.to_string(), digest);
        Ok(())
    }

    async fn blob_exists(&self, repository: &str, digest: &str) -> Result<bool> {
        let state = self.state.lock().unwrap();
        if state.failing_blobs.contains(digest) {
            return Err(SyncError::server("fake blob existence check failed", 500));
        }
        Ok(state
            .repos
            .get(repository)
            .map(|r| r.blobs.contains_key(digest))
            .unwrap_or(false))
    }

    async fn pull_blob(&self, repository: &str, digest: &str) -> Result<BlobStream> {
        let state = self.state.lock().unwrap();
        if state.failing_blobs.contains(digest) {
            return Err(SyncError::network("fake blob pull failed"));
        }
        let content = state
            .repos
            .get(repository)
            .and_then(|r| r.blobs.get(digest))
            .cloned()
            .ok_or_else(|| SyncError::not_found("blob", digest))?;
        Ok(Box::pin(stream::once(async move {
            Ok(bytes::Bytes::from(content))
        })))
    }

    async fn push_blob(
        &self,
        repository: &str,
        digest: &str,
        _size: u64,
        mut body: BlobStream,
    ) -> Result<()> {
        if self.state.lock().unwrap().failing_blobs.contains(digest) {
            return Err(SyncError::network("fake blob push failed"));
        }

        let mut buf = Vec::new();
        while let Some(chunk) = body.next().await {
            let chunk = chunk
                .map_err(|e| SyncError::network_with_source("failed reading pushed blob stream", e))?;
            buf.extend_from_slice(&chunk);
        }

        self.state
            .lock()
            .unwrap()
            .repos
            .entry(repository.to_string())
            .or_default()
            .blobs
            .insert(digest.to_string(), buf);
        Ok(())
    }
}
