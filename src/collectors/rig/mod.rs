//! Rig telemetry polling module
//!
//! This module is the polling/retry engine for cgminer-dialect rig
//! controllers, organized into focused sub-modules:
//!
//! - `collector`: Core RigCollector implementation, reachability gate and
//!   per-command retry loops
//! - `net`: Address resolution and TCP connection establishment behind the
//!   `Dialer` seam
//! - `fetch`: Single request/response exchange, response sanitization and
//!   JSON decoding
//! - `retry`: Shared retry-with-escalating-timeout loop
//! - `sink`: Handoff boundary to persistence
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rig_watcher::collectors::rig::RigCollector;
//! use rig_watcher::models::{Endpoint, RetryPolicy};
//!
//! let collector = RigCollector::new(Endpoint::new("10.0.0.42", 4028));
//! let results = collector.collect(RetryPolicy::new(3));
//! ```

// Module declarations
pub mod collector;
pub mod fetch;
pub mod net;
pub mod retry;
pub mod sink;

// Re-export the main collector - primary public interface
pub use collector::{PROBE_PORT, RigCollector};

// Re-export the types callers interact with directly
pub use fetch::{FetchError, FetchOutcome};
pub use net::{ConnectError, Connection, Dialer, TcpDialer};
pub use retry::{AttemptOutcome, retry_with_escalating_timeout};
pub use sink::{ResultSink, VecSink};

#[cfg(test)]
pub mod tests;
