//! Rig Watcher - telemetry polling for ASIC mining-rig controllers
//!
//! The library core is the polling/retry engine in [`collectors::rig`];
//! [`storage`] holds the SQLite sink consumer and [`cli`] the command-line
//! surface used by the `rigw` binary.

pub mod cli;
pub mod collectors;
pub mod config;
pub mod models;
pub mod storage;

pub use collectors::RigCollector;
pub use models::{CollectionResult, CycleRecord, Endpoint, RawResult, RetryPolicy, TelemetryCommand};
