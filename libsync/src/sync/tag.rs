//! Tag synchronizer: the `pending -> coping -> pullManifest -> (done |
//! copyLayers -> pushManifest -> done)` state machine, with `error` as a
//! terminal state reachable from any step.

use crate::error::Result;
use crate::gate::Gate;
use crate::manifest::Manifest;
use crate::registry::RegistryApi;
use crate::status::{Status, StatusStore};
use futures::future::join_all;
use std::time::Duration;

use super::blob::transfer_blob;

/// Pacing delay applied before copying a tag's layers, to avoid bursting
/// the source registry on large repositories.
const COPY_LAYERS_PACING: Duration = Duration::from_secs(1);

/// Synchronizes a single tag from `source` to `target`.
///
/// Reports every state transition into `status`. Returns `Ok(())` once the
/// tag reaches `done`; returns `Err` (after recording `error`) on the first
/// unrecoverable failure. Blob transfers within the tag are bounded by
/// `blob_gate`.
#[allow(clippy::too_many_arguments)]
pub async fn sync_tag(
    source: &dyn RegistryApi,
    target: &dyn RegistryApi,
    repository: &str,
    tag: &str,
    replication: &str,
    status: &StatusStore,
    blob_gate: &Gate,
) -> Result<()> {
    status.set_tag_status(replication, repository, tag, Status::Coping, None);

    let result = sync_tag_inner(
        source,
        target,
        repository,
        tag,
        replication,
        status,
        blob_gate,
    )
    .await;

    match &result {
        Ok(()) => status.set_tag_status(replication, repository, tag, Status::Done, None),
        Err(e) => status.set_tag_status(
            replication,
            repository,
            tag,
            Status::Error,
            Some(e.to_string()),
        ),
    }

    result
}

#[allow(clippy::too_many_arguments)]
async fn sync_tag_inner(
    source: &dyn RegistryApi,
    target: &dyn RegistryApi,
    repository: &str,
    tag: &str,
    replication: &str,
    status: &StatusStore,
    blob_gate: &Gate,
) -> Result<()> {
    status.set_tag_status(replication, repository, tag, Status::PullManifest, None);

    let (source_payload, source_media_type, source_digest) =
        source.pull_manifest(repository, tag).await?;

    let target_digest = match target.pull_manifest(repository, tag).await {
        Ok((_, _, digest)) => Some(digest),
        Err(_) => None,
    };

    if target_digest.as_deref() == Some(source_digest.as_str()) {
        return Ok(());
    }

    let manifest = Manifest::parse(source_digest.clone(), &source_media_type, source_payload.clone())?;
    let references = manifest.references()?;

    status.set_tag_status(replication, repository, tag, Status::CopyLayers, None);
    tokio::time::sleep(COPY_LAYERS_PACING).await;

    let transfers = references.iter().map(|descriptor| async move {
        let _guard = blob_gate.add().await;
        transfer_blob(source, target, repository, descriptor).await
    });
    let results = join_all(transfers).await;
    for result in results {
        result?;
    }

    status.set_tag_status(replication, repository, tag, Status::PushManifest, None);

    let (existing_digest, exists) = target.manifest_exists(repository, tag).await?;
    if exists && existing_digest == source_digest {
        return Ok(());
    }

    let (media_type, payload) = manifest.as_payload();
    target.push_manifest(repository, tag, media_type, payload).await
}
