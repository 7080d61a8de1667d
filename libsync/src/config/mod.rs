//! Daemon configuration.
//!
//! A replication daemon is configured by a single YAML document listing the
//! replications it should run. See [`Config::from_yaml_str`] and
//! [`Config::load`].

use crate::auth::Credentials;
use crate::error::{Result, SyncError};
use config::{Config as ConfigRs, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;


/// Root configuration: the full set of replications the daemon should run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Config {
    #[serde(default)]
    pub replications: Vec<ReplicationConfig>,
}

impl Config {
    /// Parses a `Config` from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let builder = ConfigRs::builder()
            .add_source(ConfigRs::try_from(&Config::default())?)
            .add_source(File::from_str(s, FileFormat::Yaml));
        Self::from_builder(builder)
    }

    /// Loads a `Config` from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let builder = ConfigRs::builder()
            .add_source(ConfigRs::try_from(&Config::default())?)
            .add_source(File::from(path).required(true));
        Self::from_builder(builder)
    }

    fn from_builder(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        let config: Config = builder
            .build()
            .and_then(|cfg| cfg.try_deserialize())
            .map_err(|e| {
                SyncError::config_with_source("failed to deserialize configuration", None::<String>, e)
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations with duplicate replication names, since the
    /// status store and the HTTP status API key state by name.
    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for replication in &self.replications {
            if !seen.insert(replication.name.as_str()) {
                return Err(SyncError::config(
                    format!("duplicate replication name: {}", replication.name),
                    None::<String>,
                ));
            }
        }
        Ok(())
    }
}

/// One source-to-target replication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplicationConfig {
    /// Unique name for this replication (used as its status-store key).
    pub name: String,
    pub source: RegistryEndpoint,
    pub target: RegistryEndpoint,
    /// Substring filter: only repositories whose name contains this string
    /// are replicated. An empty filter matches every repository.
    #[serde(default)]
    pub filter: String,
    /// How often to re-run the replication, in seconds.
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
}

fn default_interval_seconds() -> u64 {
    300
}

/// One side (source or target) of a replication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistryEndpoint {
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl RegistryEndpoint {
    /// Builds [`Credentials`] from this endpoint's username/password, or
    /// [`Credentials::Anonymous`] if neither is set.
    pub fn credentials(&self) -> Credentials {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => {
                Credentials::basic(username.clone(), password.clone())
            }
            _ => Credentials::anonymous(),
        }
    }
}
