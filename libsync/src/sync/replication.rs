//! The replication loop: ping both ends, list the source catalog, filter by
//! substring, and fan repositories out behind a bounded gate.

use crate::error::Result;
use crate::gate::Gate;
use crate::registry::RegistryApi;
use crate::status::StatusStore;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

use super::repo::sync_repository;

/// Default number of repositories replicated concurrently.
pub const DEFAULT_REPO_CONCURRENCY: usize = 3;
/// Default number of blobs transferred concurrently within a tag.
pub const DEFAULT_BLOB_CONCURRENCY: usize = 10;

/// Runs one replication pass: ping, catalog, filter, fan out.
///
/// Returns `Err` only for failures that abort the whole run (the source or
/// target being unreachable). Per-repository failures are recorded in
/// `status` and do not fail the overall run.
pub async fn run_once(
    name: &str,
    source: &dyn RegistryApi,
    target: &dyn RegistryApi,
    filter: &str,
    status: &StatusStore,
    repo_gate: &Gate,
    blob_gate: &Gate,
) -> Result<()> {
    source.ping().await?;
    target.ping().await?;

    let catalog = source.catalog().await?;
    let repositories: Vec<String> = catalog
        .into_iter()
        .filter(|repo| filter.is_empty() || repo.contains(filter))
        .collect();

    let tasks = repositories.iter().map(|repository| async move {
        let _guard = repo_gate.add().await;
        sync_repository(source, target, repository, name, status, blob_gate).await
    });
    join_all(tasks).await;

    Ok(())
}

/// Runs `run_once` forever on `interval`, logging and continuing past any
/// error the run reports (a single unreachable registry shouldn't kill the
/// daemon; the next tick tries again).
pub async fn run_forever(
    name: String,
    source: Arc<dyn RegistryApi>,
    target: Arc<dyn RegistryApi>,
    filter: String,
    interval: Duration,
    status: Arc<StatusStore>,
) {
    let repo_gate = Gate::new(DEFAULT_REPO_CONCURRENCY);
    let blob_gate = Gate::new(DEFAULT_BLOB_CONCURRENCY);

    loop {
        log::info!("starting replication pass for '{name}'");
        if let Err(e) = run_once(
            &name,
            source.as_ref(),
            target.as_ref(),
            &filter,
            status.as_ref(),
            &repo_gate,
            &blob_gate,
        )
        .await
        {
            log::error!("replication pass for '{name}' failed: {e}");
        }
        tokio::time::sleep(interval).await;
    }
}
