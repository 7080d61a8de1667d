//! Single-blob transfer: existence check, streamed pull, digest verification,
//! and re-push.

use crate::error::{Result, SyncError};
use crate::manifest::Descriptor;
use crate::registry::{BlobStream, RegistryApi};
use futures::StreamExt;
use sha2::{Digest as Sha2Digest, Sha256};
use std::sync::{Arc, Mutex};

/// Copies one blob from `source` to `target` if `target` doesn't already
/// have it. Callers fan this out behind a [`crate::gate::Gate`] to bound
/// how many blob transfers run concurrently within a tag.
///
/// The pulled stream is piped straight into the push without ever being
/// buffered in full; the digest is verified by hashing chunks as they pass
/// through, so a mismatch is only caught after the push completes.
pub async fn transfer_blob(
    source: &dyn RegistryApi,
    target: &dyn RegistryApi,
    repository: &str,
    descriptor: &Descriptor,
) -> Result<()> {
    if target.blob_exists(repository, &descriptor.digest).await? {
        return Ok(());
    }

    let expected_hex = descriptor
        .digest
        .strip_prefix("sha256:")
        .ok_or_else(|| {
            SyncError::validation(format!(
                "unsupported digest algorithm in {}",
                descriptor.digest
            ))
        })?
        .to_string();

    let pulled = source.pull_blob(repository, &descriptor.digest).await?;
    let hasher = Arc::new(Mutex::new(Sha256::new()));
    let hashing = {
        let hasher = hasher.clone();
        pulled.inspect(move |chunk| {
            if let Ok(bytes) = chunk {
                hasher.lock().unwrap().update(bytes);
            }
        })
    };
    let hashing: BlobStream = Box::pin(hashing);

    target
        .push_blob(repository, &descriptor.digest, descriptor.size, hashing)
        .await?;

    let computed = format!("{:x}", hasher.lock().unwrap().clone().finalize());
    if computed != expected_hex {
        return Err(SyncError::validation(format!(
            "blob digest mismatch: expected {}, computed sha256:{computed}",
            descriptor.digest
        )));
    }
    Ok(())
}
