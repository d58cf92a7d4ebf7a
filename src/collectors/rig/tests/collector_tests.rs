//! Tests for the collection cycle and reachability gate

use std::time::Duration;

use chrono::Utc;
use serde_json::json;

use crate::collectors::rig::sink::VecSink;
use crate::collectors::rig::tests::support::{Script, ScriptedDialer};
use crate::collectors::rig::RigCollector;
use crate::models::{Endpoint, RawResult, RetryPolicy, TelemetryCommand};

fn endpoint() -> Endpoint {
    Endpoint::new("10.0.0.42", 4028)
}

const SUMMARY: &str = r#"{"STATUS":[{"STATUS":"S"}],"SUMMARY":[{"Elapsed":83}],"id":1}"#;
const EDEVS: &str = r#"{"STATUS":[{"STATUS":"S"}],"DEVS":[{"ASC":0}],"id":1}"#;
const ESTATS: &str = r#"{"STATUS":[{"STATUS":"S"}],"STATS":[{"STATS":0}],"id":1}"#;
const POOLS: &str = r#"{"STATUS":[{"STATUS":"S"}],"POOLS":[{"POOL":0}],"id":1}"#;

fn fully_scripted(dialer: ScriptedDialer) -> ScriptedDialer {
    dialer
        .respond_json("summary", SUMMARY)
        .respond_json("edevs", EDEVS)
        .respond_json("estats", ESTATS)
        .respond_json("pools", POOLS)
}

#[test]
fn test_probe_attempt_schedule_on_unreachable_host() {
    let dialer = ScriptedDialer::unreachable();
    let collector = RigCollector::with_dialer(endpoint(), dialer.clone());

    assert!(!collector.probe(RetryPolicy::new(4)));

    // Exactly R attempts, timeouts escalating in half-second steps.
    assert_eq!(
        dialer.probe_attempts(),
        vec![
            Duration::from_millis(500),
            Duration::from_millis(1000),
            Duration::from_millis(1500),
            Duration::from_millis(2000),
        ]
    );
}

#[test]
fn test_failed_probe_short_circuits_cycle() {
    let dialer = fully_scripted(ScriptedDialer::unreachable());
    let collector = RigCollector::with_dialer(endpoint(), dialer.clone());

    let results = collector.collect(RetryPolicy::new(3));

    for (_, result) in results.iter() {
        assert!(result.is_absent());
    }
    assert_eq!(dialer.telemetry_dials(), 0, "no fetch may occur after a failed probe");
}

#[test]
fn test_commands_issued_in_fixed_order() {
    let dialer = fully_scripted(ScriptedDialer::reachable());
    let collector = RigCollector::with_dialer(endpoint(), dialer.clone());

    collector.collect(RetryPolicy::new(3));

    assert_eq!(
        dialer.command_order(),
        vec!["summary", "edevs", "estats", "pools"]
    );
}

#[test]
fn test_first_valid_response_short_circuits_retries() {
    let dialer = fully_scripted(ScriptedDialer::reachable());
    let collector = RigCollector::with_dialer(endpoint(), dialer.clone());

    collector.collect(RetryPolicy::new(5));

    // One attempt per command when the first response is valid.
    assert_eq!(dialer.exchanges().len(), 4);
}

#[test]
fn test_fetch_timeouts_escalate_across_attempts() {
    let dialer = ScriptedDialer::reachable()
        .script("summary", Script::Fail)
        .script("summary", Script::Fail)
        .respond_json("summary", SUMMARY);
    let dialer = fully_scripted(dialer);
    let collector = RigCollector::with_dialer(endpoint(), dialer.clone());

    let results = collector.collect(RetryPolicy::new(3));

    assert_eq!(
        results.get(TelemetryCommand::Summary),
        &RawResult::Value(serde_json::from_str(SUMMARY).unwrap())
    );
    let summary_timeouts: Vec<Duration> = dialer
        .exchanges()
        .into_iter()
        .filter(|(name, _)| name == "summary")
        .map(|(_, timeout)| timeout)
        .collect();
    assert_eq!(
        summary_timeouts,
        vec![
            Duration::from_millis(500),
            Duration::from_millis(1000),
            Duration::from_millis(1500),
        ]
    );
}

#[test]
fn test_failed_exchanges_exhausting_budget_store_absent() {
    let dialer = ScriptedDialer::reachable()
        .script("edevs", Script::Fail)
        .script("edevs", Script::Fail)
        .script("edevs", Script::Fail)
        .respond_json("summary", SUMMARY)
        .respond_json("estats", ESTATS)
        .respond_json("pools", POOLS);
    let collector = RigCollector::with_dialer(endpoint(), dialer);

    let results = collector.collect(RetryPolicy::new(3));

    assert!(results.get(TelemetryCommand::Edevs).is_absent());
    // The other commands are unaffected by one command's failure.
    assert!(results.get(TelemetryCommand::Summary).as_value().is_some());
    assert!(results.get(TelemetryCommand::Estats).as_value().is_some());
    assert!(results.get(TelemetryCommand::Pools).as_value().is_some());
}

#[test]
fn test_malformed_response_stored_without_breaking_cycle() {
    let dialer = ScriptedDialer::reachable()
        .respond_json("summary", SUMMARY)
        .script("edevs", Script::Respond(b"STATUS=S,Elapsed=83|".to_vec()))
        .script("edevs", Script::Respond(b"STATUS=S,Elapsed=84|".to_vec()))
        .respond_json("estats", ESTATS)
        .respond_json("pools", POOLS);
    let collector = RigCollector::with_dialer(endpoint(), dialer);

    let results = collector.collect(RetryPolicy::new(2));

    assert_eq!(results.get(TelemetryCommand::Edevs), &RawResult::Malformed);
    assert!(results.get(TelemetryCommand::Summary).as_value().is_some());
    assert!(results.get(TelemetryCommand::Pools).as_value().is_some());
}

#[test]
fn test_empty_decoded_value_is_retried_but_stored() {
    // Empty objects decode fine yet count as failed attempts; the last
    // attempt's value is what lands in the result set.
    let dialer = ScriptedDialer::reachable()
        .respond_json("summary", "{}")
        .respond_json("summary", "{}")
        .respond_json("edevs", EDEVS)
        .respond_json("estats", ESTATS)
        .respond_json("pools", POOLS);
    let collector = RigCollector::with_dialer(endpoint(), dialer.clone());

    let results = collector.collect(RetryPolicy::new(2));

    assert_eq!(
        results.get(TelemetryCommand::Summary),
        &RawResult::Value(json!({}))
    );
    let summary_attempts = dialer
        .exchanges()
        .iter()
        .filter(|(name, _)| name == "summary")
        .count();
    assert_eq!(summary_attempts, 2, "empty values must consume the full budget");
}

#[test]
fn test_round_trip_of_canned_responses() {
    let dialer = fully_scripted(ScriptedDialer::reachable());
    let collector = RigCollector::with_dialer(endpoint(), dialer);

    let results = collector.collect(RetryPolicy::new(3));

    for (command, canned) in [
        (TelemetryCommand::Summary, SUMMARY),
        (TelemetryCommand::Edevs, EDEVS),
        (TelemetryCommand::Estats, ESTATS),
        (TelemetryCommand::Pools, POOLS),
    ] {
        assert_eq!(
            results.get(command),
            &RawResult::Value(serde_json::from_str(canned).unwrap())
        );
    }
}

#[test]
fn test_collect_is_idempotent_against_deterministic_server() {
    let policy = RetryPolicy::new(3);

    let first = {
        let collector =
            RigCollector::with_dialer(endpoint(), fully_scripted(ScriptedDialer::reachable()));
        collector.collect(policy)
    };
    let second = {
        let collector =
            RigCollector::with_dialer(endpoint(), fully_scripted(ScriptedDialer::reachable()));
        collector.collect(policy)
    };

    assert_eq!(first, second);
}

#[test]
fn test_run_hands_record_to_sink() {
    let dialer = fully_scripted(ScriptedDialer::reachable());
    let collector = RigCollector::with_dialer(endpoint(), dialer);
    let sink = VecSink::new();
    let run_time = Utc::now();

    collector.run(run_time, RetryPolicy::new(3), &sink);

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].run_time, run_time);
    assert_eq!(records[0].endpoint, endpoint());
    assert!(records[0]
        .results
        .get(TelemetryCommand::Summary)
        .as_value()
        .is_some());
}

#[test]
fn test_run_submits_degraded_record_for_dead_host() {
    let collector = RigCollector::with_dialer(endpoint(), ScriptedDialer::unreachable());
    let sink = VecSink::new();

    collector.run(Utc::now(), RetryPolicy::new(2), &sink);

    let records = sink.records();
    assert_eq!(records.len(), 1, "degraded cycles are persisted, not dropped");
    for (_, result) in records[0].results.iter() {
        assert!(result.is_absent());
    }
}
