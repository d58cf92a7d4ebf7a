//! Projection of raw cycle results into persistence rows
//!
//! The poller hands over raw decoded JSON per command; this module projects
//! the summary and pools payloads into the miner/pool record families. The
//! projection is tolerant by construction: a field the controller did not
//! report becomes NULL, an absent or malformed command yields a degraded row
//! (miner) or no rows (pool), and nothing here ever fails a cycle.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::models::{CycleRecord, RawResult, TelemetryCommand};

/// One row of the miner family, keyed by `(time, host, port)`.
#[derive(Debug, Clone, Default)]
pub struct MinerRecord {
    pub elapsed: Option<i64>,
    pub mhs_av: Option<f64>,
    pub mhs_5s: Option<f64>,
    pub mhs_1m: Option<f64>,
    pub mhs_5m: Option<f64>,
    pub mhs_15m: Option<f64>,
    pub mhs: Option<f64>,
    pub found_blocks: Option<i64>,
    pub getworks: Option<i64>,
    pub accepted: Option<i64>,
    pub rejected: Option<i64>,
    pub hardware_errors: Option<i64>,
    pub utility: Option<f64>,
    pub discarded: Option<i64>,
    pub stale: Option<i64>,
    pub get_failures: Option<i64>,
    pub local_work: Option<i64>,
    pub remote_failures: Option<i64>,
    pub network_blocks: Option<i64>,
    pub total_mh: Option<f64>,
    pub work_utility: Option<f64>,
    pub difficulty_accepted: Option<f64>,
    pub difficulty_rejected: Option<f64>,
    pub difficulty_stale: Option<f64>,
    pub best_share: Option<i64>,
    pub device_hardware: Option<f64>,
    pub device_rejected: Option<f64>,
    pub pool_rejected: Option<f64>,
    pub pool_stale: Option<f64>,
    pub last_getwork: Option<i64>,
}

/// One row of the pool family, keyed by `(time, host, port, pool_id)`.
#[derive(Debug, Clone, Default)]
pub struct PoolRecord {
    pub pool_id: i64,
    pub pool: Option<i64>,
    pub url: Option<String>,
    pub status: Option<String>,
    pub priority: Option<i64>,
    pub quota: Option<i64>,
    pub long_poll: Option<String>,
    pub getworks: Option<i64>,
    pub accepted: Option<i64>,
    pub rejected: Option<i64>,
    pub works: Option<i64>,
    pub discarded: Option<i64>,
    pub stale: Option<i64>,
    pub get_failures: Option<i64>,
    pub remote_failures: Option<i64>,
    pub user: Option<String>,
    pub last_share_time: Option<i64>,
    pub diff1_shares: Option<i64>,
    pub proxy_type: Option<String>,
    pub proxy: Option<String>,
    pub difficulty_accepted: Option<f64>,
    pub difficulty_rejected: Option<f64>,
    pub difficulty_stale: Option<f64>,
    pub last_share_difficulty: Option<f64>,
    pub has_stratum: Option<bool>,
    pub stratum_active: Option<bool>,
    pub stratum_url: Option<String>,
    pub has_gbt: Option<bool>,
    pub best_share: Option<i64>,
    pub pool_rejected: Option<f64>,
    pub pool_stale: Option<f64>,
}

/// Timestamp of the moment a record family row was projected, as opposed to
/// the fleet-wide run time used as the primary key.
pub fn precise_time() -> DateTime<Utc> {
    Utc::now()
}

impl MinerRecord {
    /// Projects the summary payload of a cycle. A cycle whose summary is
    /// absent or malformed projects to an all-NULL record.
    pub fn from_cycle(record: &CycleRecord) -> Self {
        let summary = match record.results.get(TelemetryCommand::Summary) {
            RawResult::Value(value) => value,
            RawResult::Malformed | RawResult::Absent => return Self::default(),
        };
        let Some(fields) = section(summary, "SUMMARY").and_then(Value::as_object) else {
            return Self::default();
        };

        Self {
            elapsed: get_i64(fields, "Elapsed"),
            mhs_av: get_f64(fields, "MHS av"),
            mhs_5s: get_f64(fields, "MHS 5s"),
            mhs_1m: get_f64(fields, "MHS 1m"),
            mhs_5m: get_f64(fields, "MHS 5m"),
            mhs_15m: get_f64(fields, "MHS 15m"),
            mhs: get_f64(fields, "MHS"),
            found_blocks: get_i64(fields, "Found Blocks"),
            getworks: get_i64(fields, "Getworks"),
            accepted: get_i64(fields, "Accepted"),
            rejected: get_i64(fields, "Rejected"),
            hardware_errors: get_i64(fields, "Hardware Errors"),
            utility: get_f64(fields, "Utility"),
            discarded: get_i64(fields, "Discarded"),
            stale: get_i64(fields, "Stale"),
            get_failures: get_i64(fields, "Get Failures"),
            local_work: get_i64(fields, "Local Work"),
            remote_failures: get_i64(fields, "Remote Failures"),
            network_blocks: get_i64(fields, "Network Blocks"),
            total_mh: get_f64(fields, "Total MH"),
            work_utility: get_f64(fields, "Work Utility"),
            difficulty_accepted: get_f64(fields, "Difficulty Accepted"),
            difficulty_rejected: get_f64(fields, "Difficulty Rejected"),
            difficulty_stale: get_f64(fields, "Difficulty Stale"),
            best_share: get_i64(fields, "Best Share"),
            device_hardware: get_f64(fields, "Device Hardware%"),
            device_rejected: get_f64(fields, "Device Rejected%"),
            pool_rejected: get_f64(fields, "Pool Rejected%"),
            pool_stale: get_f64(fields, "Pool Stale%"),
            last_getwork: get_i64(fields, "Last getwork"),
        }
    }
}

impl PoolRecord {
    /// Projects the pools payload of a cycle into one record per pool entry.
    /// Absent or malformed pools data projects to no rows.
    pub fn from_cycle(record: &CycleRecord) -> Vec<Self> {
        let pools = match record.results.get(TelemetryCommand::Pools) {
            RawResult::Value(value) => value,
            RawResult::Malformed | RawResult::Absent => return Vec::new(),
        };
        let Some(entries) = pools.get("POOLS").and_then(Value::as_array) else {
            return Vec::new();
        };

        entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                let fields = entry.as_object()?;
                Some(Self {
                    pool_id: get_i64(fields, "POOL").unwrap_or(index as i64),
                    pool: get_i64(fields, "POOL"),
                    url: get_str(fields, "URL"),
                    status: get_str(fields, "Status"),
                    priority: get_i64(fields, "Priority"),
                    quota: get_i64(fields, "Quota"),
                    long_poll: get_str(fields, "Long Poll"),
                    getworks: get_i64(fields, "Getworks"),
                    accepted: get_i64(fields, "Accepted"),
                    rejected: get_i64(fields, "Rejected"),
                    works: get_i64(fields, "Works"),
                    discarded: get_i64(fields, "Discarded"),
                    stale: get_i64(fields, "Stale"),
                    get_failures: get_i64(fields, "Get Failures"),
                    remote_failures: get_i64(fields, "Remote Failures"),
                    user: get_str(fields, "User"),
                    last_share_time: get_i64(fields, "Last Share Time"),
                    diff1_shares: get_i64(fields, "Diff1 Shares"),
                    proxy_type: get_str(fields, "Proxy Type"),
                    proxy: get_str(fields, "Proxy"),
                    difficulty_accepted: get_f64(fields, "Difficulty Accepted"),
                    difficulty_rejected: get_f64(fields, "Difficulty Rejected"),
                    difficulty_stale: get_f64(fields, "Difficulty Stale"),
                    last_share_difficulty: get_f64(fields, "Last Share Difficulty"),
                    has_stratum: get_bool(fields, "Has Stratum"),
                    stratum_active: get_bool(fields, "Stratum Active"),
                    stratum_url: get_str(fields, "Stratum URL"),
                    has_gbt: get_bool(fields, "Has GBT"),
                    best_share: get_i64(fields, "Best Share"),
                    pool_rejected: get_f64(fields, "Pool Rejected%"),
                    pool_stale: get_f64(fields, "Pool Stale%"),
                })
            })
            .collect()
    }
}

/// Controller responses wrap each payload in a single-element array section,
/// e.g. `{"SUMMARY": [{...}], "STATUS": [...], "id": 1}`.
fn section<'a>(response: &'a Value, name: &str) -> Option<&'a Value> {
    response.get(name).and_then(|v| v.get(0))
}

fn get_f64(fields: &Map<String, Value>, key: &str) -> Option<f64> {
    fields.get(key).and_then(Value::as_f64)
}

fn get_i64(fields: &Map<String, Value>, key: &str) -> Option<i64> {
    fields.get(key).and_then(Value::as_i64)
}

fn get_str(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn get_bool(fields: &Map<String, Value>, key: &str) -> Option<bool> {
    fields.get(key).and_then(Value::as_bool)
}
