//! Application configuration
//!
//! Loaded from an optional TOML file with sensible defaults, so `rigw poll`
//! works with nothing but a host on the command line while `rigw watch` reads
//! the fleet from configuration.

use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;

use crate::models::Endpoint;

/// Default controller API port.
pub const DEFAULT_RIG_PORT: u16 = 4028;

/// Default retry budget per probe/fetch.
pub const DEFAULT_RETRY: u32 = 3;

/// Default seconds between fleet polls.
pub const DEFAULT_INTERVAL_SECS: u64 = 60;

fn default_database() -> String {
    "data/rig_watcher.db".to_string()
}

fn default_retry() -> u32 {
    DEFAULT_RETRY
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECS
}

fn default_port() -> u16 {
    DEFAULT_RIG_PORT
}

/// One rig entry from the configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct RigEntry {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl RigEntry {
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.port)
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// SQLite database path.
    #[serde(default = "default_database")]
    pub database: String,

    /// Retry budget per probe/fetch loop.
    #[serde(default = "default_retry")]
    pub retry: u32,

    /// Seconds between fleet polls.
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Rigs to poll.
    #[serde(default)]
    pub rigs: Vec<RigEntry>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            retry: default_retry(),
            interval_secs: default_interval(),
            rigs: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from the given file, or from `rig-watcher.toml`
    /// in the working directory when no path is given. A missing default
    /// file yields the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        builder = match path {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::with_name("rig-watcher").required(false)),
        };

        builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Failed to parse configuration")
    }
}
