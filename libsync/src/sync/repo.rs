//! Repository synchronizer: lists a repository's tags on the source and
//! replicates each one in turn, bounding concurrent blob transfers with a
//! shared gate.

use crate::error::Result;
use crate::gate::Gate;
use crate::registry::RegistryApi;
use crate::status::{Status, StatusStore};

use super::tag::sync_tag;

/// Synchronizes every tag of `repository` from `source` to `target`.
///
/// A single tag failing does not abort the others; every tag is attempted,
/// and the repository's own status is `Error` if any tag failed, `Done`
/// otherwise.
pub async fn sync_repository(
    source: &dyn RegistryApi,
    target: &dyn RegistryApi,
    repository: &str,
    replication: &str,
    status: &StatusStore,
    blob_gate: &Gate,
) -> Result<()> {
    status.set_project_status(replication, repository, Status::Coping, None);

    let tags = match source.list_tags(repository).await {
        Ok(tags) => tags,
        Err(e) => {
            status.set_project_status(replication, repository, Status::Error, Some(e.to_string()));
            return Err(e);
        }
    };

    let mut failures = Vec::new();
    for tag in &tags {
        if let Err(e) = sync_tag(source, target, repository, tag, replication, status, blob_gate).await {
            failures.push(format!("{tag}: {e}"));
        }
    }

    if failures.is_empty() {
        status.set_project_status(replication, repository, Status::Done, None);
        Ok(())
    } else {
        let message = failures.join("; ");
        status.set_project_status(
            replication,
            repository,
            Status::Error,
            Some(message.clone()),
        );
        Err(crate::error::SyncError::validation(format!(
            "{repository}: {message}"
        )))
    }
}
