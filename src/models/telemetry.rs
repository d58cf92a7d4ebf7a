use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identity of a pollable rig controller.
///
/// Supplied fresh by the caller for every cycle; the poller caches nothing
/// across cycles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // IPv6 literals get parenthesized so the port separator stays readable
        if self.host.contains(':') {
            write!(f, "[({}):{}]", self.host, self.port)
        } else {
            write!(f, "[{}:{}]", self.host, self.port)
        }
    }
}

/// Bounded retry budget with escalating per-attempt timeouts.
///
/// The timeout is derived, not stored: attempt `n` gets `n / 2` seconds, so a
/// policy with 3 attempts probes at 0.5s, 1.0s, and 1.5s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl RetryPolicy {
    /// Creates a policy with the given attempt budget (minimum 1).
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Timeout for a 1-based attempt number: `attempt / 2` seconds.
    pub fn timeout_for(&self, attempt: u32) -> Duration {
        Duration::from_millis(u64::from(attempt) * 500)
    }

    /// Iterates `(attempt, timeout)` pairs in escalation order.
    pub fn attempts(&self) -> impl Iterator<Item = (u32, Duration)> + use<> {
        let policy = *self;
        (1..=policy.max_attempts).map(move |n| (n, policy.timeout_for(n)))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

/// The fixed telemetry command set, in the order a cycle issues them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TelemetryCommand {
    Summary,
    Edevs,
    Estats,
    Pools,
}

impl TelemetryCommand {
    /// Cycle order. This ordering is part of the observable contract.
    pub const ALL: [TelemetryCommand; 4] = [
        TelemetryCommand::Summary,
        TelemetryCommand::Edevs,
        TelemetryCommand::Estats,
        TelemetryCommand::Pools,
    ];

    /// Wire name of the command.
    pub fn name(self) -> &'static str {
        match self {
            TelemetryCommand::Summary => "summary",
            TelemetryCommand::Edevs => "edevs",
            TelemetryCommand::Estats => "estats",
            TelemetryCommand::Pools => "pools",
        }
    }
}

impl fmt::Display for TelemetryCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one command within a finished cycle.
///
/// `Absent` means no response was ever obtained (connection failures through
/// every attempt); `Malformed` means a response arrived but was not valid JSON.
/// The distinction lets downstream consumers tell "asked, got nothing" from
/// "asked, got garbage".
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawResult {
    Value(Value),
    Malformed,
    #[default]
    Absent,
}

impl RawResult {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            RawResult::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, RawResult::Absent)
    }
}

/// One result per telemetry command, never a subset.
///
/// A struct field per command keeps the mapping exhaustive: adding a command
/// without wiring its result slot is a compile error.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CollectionResult {
    summary: RawResult,
    edevs: RawResult,
    estats: RawResult,
    pools: RawResult,
}

impl CollectionResult {
    /// Result set for a cycle that never got past the reachability gate.
    pub fn all_absent() -> Self {
        Self::default()
    }

    pub fn get(&self, command: TelemetryCommand) -> &RawResult {
        match command {
            TelemetryCommand::Summary => &self.summary,
            TelemetryCommand::Edevs => &self.edevs,
            TelemetryCommand::Estats => &self.estats,
            TelemetryCommand::Pools => &self.pools,
        }
    }

    pub fn set(&mut self, command: TelemetryCommand, result: RawResult) {
        let slot = match command {
            TelemetryCommand::Summary => &mut self.summary,
            TelemetryCommand::Edevs => &mut self.edevs,
            TelemetryCommand::Estats => &mut self.estats,
            TelemetryCommand::Pools => &mut self.pools,
        };
        *slot = result;
    }

    /// Iterates results in the fixed command order.
    pub fn iter(&self) -> impl Iterator<Item = (TelemetryCommand, &RawResult)> {
        TelemetryCommand::ALL
            .into_iter()
            .map(move |command| (command, self.get(command)))
    }
}

/// One finished cycle, ready for the sink.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleRecord {
    pub run_time: DateTime<Utc>,
    pub endpoint: Endpoint,
    pub results: CollectionResult,
}
