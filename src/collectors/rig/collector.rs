//! Core rig polling implementation
//!
//! One `RigCollector` drives one endpoint through a full cycle: a cheap
//! reachability probe first, then the four telemetry commands in fixed order,
//! each with its own retry loop. Per-command failure never aborts the cycle;
//! the result set always comes back with all four entries, degraded as needed.

use chrono::{DateTime, Utc};
use log::{debug, error};
use serde_json::Value;

use crate::collectors::rig::fetch::{self, FetchError, FetchOutcome};
use crate::collectors::rig::net::{Dialer, TcpDialer};
use crate::collectors::rig::retry::{AttemptOutcome, retry_with_escalating_timeout};
use crate::collectors::rig::sink::ResultSink;
use crate::models::{CollectionResult, CycleRecord, Endpoint, RawResult, RetryPolicy, TelemetryCommand};

/// The reachability probe always targets this port, not the telemetry port.
/// It checks host-level liveness, not the telemetry service itself.
pub const PROBE_PORT: u16 = 80;

/// Polls one rig controller endpoint for telemetry.
///
/// Holds no state across cycles beyond the endpoint identity; every cycle
/// resolves, connects, and collects from scratch.
pub struct RigCollector<D = TcpDialer> {
    endpoint: Endpoint,
    dialer: D,
}

impl RigCollector<TcpDialer> {
    /// Creates a collector using the production TCP dialer.
    pub fn new(endpoint: Endpoint) -> Self {
        Self::with_dialer(endpoint, TcpDialer)
    }
}

impl<D: Dialer> RigCollector<D> {
    /// Creates a collector with a custom dialer, the seam used by tests to
    /// substitute scripted connections.
    pub fn with_dialer(endpoint: Endpoint, dialer: D) -> Self {
        Self { endpoint, dialer }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Decides whether the host is currently reachable before any telemetry
    /// work, so a dead host costs one timeout cascade instead of four.
    ///
    /// Dials [`PROBE_PORT`] with escalating timeouts; a successful connect is
    /// closed immediately. No command traffic occurs during probing.
    pub fn probe(&self, policy: RetryPolicy) -> bool {
        let reached = retry_with_escalating_timeout(policy, |attempt, timeout| {
            match self.dialer.dial(&self.endpoint.host, PROBE_PORT, timeout) {
                Ok(conn) => {
                    drop(conn);
                    AttemptOutcome::Success(())
                }
                Err(err) => {
                    debug!(
                        "{} ping test attempt {attempt} failed: {err}",
                        self.endpoint
                    );
                    AttemptOutcome::Retry
                }
            }
        });
        if reached.is_none() {
            error!("{} ping test exhausted all attempts", self.endpoint);
        }
        reached.is_some()
    }

    /// Performs one request/response exchange for one command.
    ///
    /// Returns `Err` only when the exchange itself broke down (no connection,
    /// or an I/O failure mid-exchange); an undecodable response is a normal
    /// [`FetchOutcome::Malformed`] outcome.
    pub fn fetch(
        &self,
        command: TelemetryCommand,
        parameter: Option<&str>,
        timeout: std::time::Duration,
    ) -> Result<FetchOutcome, FetchError> {
        fetch::exchange(&self.dialer, &self.endpoint, command, parameter, timeout)
    }

    /// Runs one full collection cycle.
    ///
    /// If the reachability probe fails, every command maps to `Absent` and no
    /// fetch is attempted. Otherwise each command gets its own retry loop;
    /// whatever the last executed attempt produced is stored as that
    /// command's result.
    pub fn collect(&self, policy: RetryPolicy) -> CollectionResult {
        if !self.probe(policy) {
            return CollectionResult::all_absent();
        }

        let mut results = CollectionResult::all_absent();
        for command in TelemetryCommand::ALL {
            results.set(command, self.collect_command(command, policy));
        }
        results
    }

    /// Executes one cycle and hands the record to the sink.
    pub fn run(&self, run_time: DateTime<Utc>, policy: RetryPolicy, sink: &dyn ResultSink) {
        let results = self.collect(policy);
        sink.submit(CycleRecord {
            run_time,
            endpoint: self.endpoint.clone(),
            results,
        });
    }

    fn collect_command(&self, command: TelemetryCommand, policy: RetryPolicy) -> RawResult {
        let mut last = RawResult::Absent;
        retry_with_escalating_timeout(policy, |attempt, timeout| {
            match self.fetch(command, None, timeout) {
                Ok(FetchOutcome::Decoded(value)) => {
                    // An empty decoded value still counts as a failed attempt,
                    // but it is what gets stored if the budget runs out here.
                    let empty = is_empty_value(&value);
                    last = RawResult::Value(value);
                    if empty {
                        AttemptOutcome::Retry
                    } else {
                        AttemptOutcome::Success(())
                    }
                }
                Ok(FetchOutcome::Malformed) => {
                    last = RawResult::Malformed;
                    AttemptOutcome::Retry
                }
                Err(err) => {
                    last = RawResult::Absent;
                    if attempt == policy.max_attempts() {
                        error!(
                            "{} failed fetching {command}: {err}. Giving up",
                            self.endpoint
                        );
                    } else {
                        debug!(
                            "{} failed fetching {command}: {err}. Retry {attempt}",
                            self.endpoint
                        );
                    }
                    AttemptOutcome::Retry
                }
            }
        });
        last
    }
}

/// The retry loop treats a decoded-but-empty value as a failed attempt.
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
