//! Tests for address resolution and connection establishment

use std::time::Duration;

use crate::collectors::rig::net::{Dialer, TcpDialer};

#[test]
fn test_unresolvable_host_yields_connect_error() {
    let dialer = TcpDialer;
    let result = dialer.dial(
        "nonexistent.invalid",
        4028,
        Duration::from_millis(200),
    );

    let err = result.err().expect("resolution must fail");
    assert_eq!(err.host, "nonexistent.invalid");
    assert_eq!(err.port, 4028);
}

#[test]
fn test_refused_port_yields_connect_error_with_source() {
    // Port 1 on loopback is essentially never listening.
    let dialer = TcpDialer;
    let result = dialer.dial("127.0.0.1", 1, Duration::from_millis(200));

    let err = result.err().expect("connect must fail");
    assert!(err.source.is_some(), "refused connect should carry the OS error");
}

#[test]
fn test_ipv6_literal_is_accepted_by_resolution() {
    // The dial itself may fail (no listener), but resolution of a bare IPv6
    // literal must not.
    let dialer = TcpDialer;
    let result = dialer.dial("::1", 1, Duration::from_millis(200));

    if let Err(err) = result {
        assert!(err.source.is_some(), "IPv6 literal must resolve to a candidate");
    }
}
