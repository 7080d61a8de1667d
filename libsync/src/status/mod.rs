//! The process-wide replication status store.
//!
//! Every replication loop reports progress into a single [`StatusStore`],
//! which the HTTP status server reads to answer `/status/{name}` and to
//! feed the `/sync` live event stream. A [`watch`] channel carries change
//! notifications so the SSE handler can push updates without polling.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::watch;


/// The lifecycle state of a project or tag within a replication run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Coping,
    PullManifest,
    CopyLayers,
    PushManifest,
    Done,
    Error,
}

/// The status of a single tag within a project.
#[derive(Debug, Clone, Serialize)]
pub struct TagStatus {
    pub name: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TagStatus {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: Status::Pending,
            message: None,
        }
    }
}

/// The status of a single repository ("project") within a replication run.
///
/// `tags` is insertion-ordered (a `Vec`, not a map) so the status feed lists
/// tags in the order they were discovered rather than in hash order.
#[derive(Debug, Clone, Serialize)]
pub struct Project {
    pub name: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub tags: Vec<TagStatus>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: Status::Pending,
            message: None,
            tags: Vec::new(),
        }
    }

    fn tag_mut(&mut self, tag: &str) -> &mut TagStatus {
        if let Some(index) = self.tags.iter().position(|t| t.name == tag) {
            &mut self.tags[index]
        } else {
            self.tags.push(TagStatus::new(tag));
            self.tags.last_mut().unwrap()
        }
    }
}

/// A snapshot of one replication's state: every project seen so far, in
/// discovery order.
#[derive(Debug, Clone, Serialize)]
pub struct Replication {
    pub name: String,
    pub projects: Vec<Project>,
}

impl Replication {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            projects: Vec::new(),
        }
    }

    fn project_mut(&mut self, project: &str) -> &mut Project {
        if let Some(index) = self.projects.iter().position(|p| p.name == project) {
            &mut self.projects[index]
        } else {
            self.projects.push(Project::new(project));
            self.projects.last_mut().unwrap()
        }
    }
}

/// The process-wide store of replication status, keyed by replication name.
pub struct StatusStore {
    replications: Mutex<HashMap<String, Replication>>,
    changed_tx: watch::Sender<()>,
}

impl StatusStore {
    pub fn new() -> Self {
        let (changed_tx, _) = watch::channel(());
        Self {
            replications: Mutex::new(HashMap::new()),
            changed_tx,
        }
    }

    /// Subscribes to change notifications. The receiver ticks (carries no
    /// payload) whenever any replication's state changes; callers re-read
    /// via [`StatusStore::snapshot`]/[`StatusStore::snapshot_all`].
    pub fn subscribe(&self) -> watch::Receiver<()> {
        self.changed_tx.subscribe()
    }

    fn notify(&self) {
        let _ = self.changed_tx.send(());
    }

    pub fn set_project_status(
        &self,
        replication: &str,
        project: &str,
        status: Status,
        message: Option<String>,
    ) {
        {
            let mut replications = self.replications.lock().unwrap();
            let repl = replications
                .entry(replication.to_string())
                .or_insert_with(|| Replication::new(replication));
            let proj = repl.project_mut(project);
            proj.status = status;
            proj.message = message;
        }
        self.notify();
    }

    pub fn set_tag_status(
        &self,
        replication: &str,
        project: &str,
        tag: &str,
        status: Status,
        message: Option<String>,
    ) {
        {
            let mut replications = self.replications.lock().unwrap();
            let repl = replications
                .entry(replication.to_string())
                .or_insert_with(|| Replication::new(replication));
            let tag_status = repl.project_mut(project).tag_mut(tag);
            tag_status.status = status;
            tag_status.message = message;
        }
        self.notify();
    }

    /// Returns a clone of one replication's current state.
    pub fn snapshot(&self, replication: &str) -> Option<Replication> {
        self.replications.lock().unwrap().get(replication).cloned()
    }

    /// Returns a clone of every replication's current state.
    pub fn snapshot_all(&self) -> Vec<Replication> {
        self.replications.lock().unwrap().values().cloned().collect()
    }
}

impl Default for StatusStore {
    fn default() -> Self {
        Self::new()
    }
}
