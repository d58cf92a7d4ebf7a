//! Single request/response exchange with a rig controller
//!
//! The controller API speaks line-less JSON over TCP: the client opens a fresh
//! connection, sends one JSON object, and reads until the controller closes
//! the connection. There is no length prefix or delimiter; end-of-stream is
//! the message terminator. Controllers are known to pad responses with
//! non-printable filler, so everything below 0x20 is stripped before decoding.

use std::io::{Read, Write};
use std::time::Duration;

use log::{debug, error};
use serde_json::{Value, json};
use thiserror::Error;

use crate::collectors::rig::net::{ConnectError, Dialer};
use crate::models::{Endpoint, TelemetryCommand};

/// Failure modes of one exchange attempt. Both are recoverable by retrying;
/// neither is ever fatal to a cycle.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Connect(#[from] ConnectError),
    #[error("i/o error during exchange: {0}")]
    Io(#[from] std::io::Error),
}

/// What came back from one completed exchange.
///
/// A response that arrives but fails to decode is a normal outcome, not an
/// error: it is reported as `Malformed` and never raised past this boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Decoded(Value),
    Malformed,
}

/// Builds the single-line JSON request payload.
pub(crate) fn build_request(command: TelemetryCommand, parameter: Option<&str>) -> String {
    let payload = match parameter {
        Some(parameter) => json!({"command": command.name(), "parameter": parameter}),
        None => json!({"command": command.name()}),
    };
    payload.to_string()
}

/// Strips every byte below 0x20 from the raw response.
pub(crate) fn sanitize(raw: &[u8]) -> String {
    let printable: Vec<u8> = raw.iter().copied().filter(|&b| b >= 0x20).collect();
    String::from_utf8_lossy(&printable).into_owned()
}

/// Performs exactly one request/response exchange for one command.
///
/// The timeout applies to the connect call and to every subsequent read. The
/// socket is dropped (closed) on every path before this function returns, so
/// no connection ever leaks into a retry iteration.
pub(crate) fn exchange(
    dialer: &dyn Dialer,
    endpoint: &Endpoint,
    command: TelemetryCommand,
    parameter: Option<&str>,
    timeout: Duration,
) -> Result<FetchOutcome, FetchError> {
    let request = build_request(command, parameter);

    let mut conn = dialer.dial(&endpoint.host, endpoint.port, timeout)?;
    conn.write_all(request.as_bytes())?;

    let mut raw = Vec::new();
    conn.read_to_end(&mut raw)?;
    drop(conn);

    let text = sanitize(&raw);
    match serde_json::from_str(&text) {
        Ok(value) => Ok(FetchOutcome::Decoded(value)),
        Err(err) => {
            error!("{endpoint} error decoding {command} response: {err}");
            debug!("{endpoint} undecodable {command} payload: {text}");
            Ok(FetchOutcome::Malformed)
        }
    }
}
