//! libsync - OCI registry replication engine.
//!
//! `libsync` implements the core of a registry-to-registry replication
//! daemon: a bounded-concurrency gate, an async registry client adapter,
//! manifest/blob synchronization state machines, and a process-wide status
//! store. The `syncd` binary wires this engine to a config file, a CLI, and
//! an HTTP status API.
//!
//! # Architecture
//!
//! - [`registry::RegistryApi`] is the seam to a concrete registry; the real
//!   implementation is [`registry::HttpRegistryClient`], and
//!   [`registry::testing::FakeRegistry`] is an in-memory double for tests.
//! - [`gate::Gate`] bounds how many repositories and blob transfers run
//!   concurrently.
//! - [`sync::run_once`]/[`sync::run_forever`] drive one or repeated
//!   replication passes; [`sync::sync_repository`]/[`sync::sync_tag`] are
//!   the per-repository and per-tag state machines underneath.
//! - [`status::StatusStore`] records every replication's progress for the
//!   HTTP status API to read.

#![warn(clippy::all)]

pub use auth::Credentials;
pub use config::Config;
pub use digest::Digest;
pub use error::{Result, SyncError};

pub mod auth;
pub mod client;
pub mod config;
pub mod digest;
pub mod error;
pub mod gate;
pub mod manifest;
pub mod oci;
pub mod registry;
pub mod status;
pub mod sync;

/// Returns the libsync crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
