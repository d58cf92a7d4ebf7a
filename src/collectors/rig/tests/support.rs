//! Scripted dialer for deterministic polling tests
//!
//! `ScriptedDialer` plays the role of the OS network stack: probe dials
//! against port 80 succeed or fail according to the script, and telemetry
//! dials hand back in-memory connections that serve canned bytes (or break)
//! once the request names its command.

use std::collections::{HashMap, VecDeque};
use std::io::{self, Cursor, Read, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::collectors::rig::collector::PROBE_PORT;
use crate::collectors::rig::net::{ConnectError, Connection, Dialer};

/// One scripted telemetry exchange.
#[derive(Debug, Clone)]
pub enum Script {
    /// Serve these bytes, then close the connection.
    Respond(Vec<u8>),
    /// Break the connection once the request has been read.
    Fail,
}

#[derive(Default)]
struct State {
    probe_ok: bool,
    probe_attempts: Vec<Duration>,
    telemetry_dials: u32,
    exchanges: Vec<(String, Duration)>,
    scripts: HashMap<String, VecDeque<Script>>,
}

/// Dialer stub with per-command response scripts and call accounting.
#[derive(Clone, Default)]
pub struct ScriptedDialer {
    state: Arc<Mutex<State>>,
}

impl ScriptedDialer {
    /// A dialer whose probe dials always fail.
    pub fn unreachable() -> Self {
        Self::default()
    }

    /// A dialer whose probe dials succeed.
    pub fn reachable() -> Self {
        let dialer = Self::default();
        dialer.state.lock().unwrap().probe_ok = true;
        dialer
    }

    /// Queues a scripted exchange for a command. Scripts are consumed in
    /// order, one per attempt; a command with an exhausted queue serves an
    /// empty response.
    pub fn script(self, command: &str, script: Script) -> Self {
        self.state
            .lock()
            .unwrap()
            .scripts
            .entry(command.to_string())
            .or_default()
            .push_back(script);
        self
    }

    /// Queues a JSON response for a command.
    pub fn respond_json(self, command: &str, json: &str) -> Self {
        self.script(command, Script::Respond(json.as_bytes().to_vec()))
    }

    /// Timeouts of every probe dial, in call order.
    pub fn probe_attempts(&self) -> Vec<Duration> {
        self.state.lock().unwrap().probe_attempts.clone()
    }

    /// Number of dials against the telemetry port.
    pub fn telemetry_dials(&self) -> u32 {
        self.state.lock().unwrap().telemetry_dials
    }

    /// `(command, timeout)` for every completed request read, in call order.
    pub fn exchanges(&self) -> Vec<(String, Duration)> {
        self.state.lock().unwrap().exchanges.clone()
    }

    /// Command names in the order the poller issued them.
    pub fn command_order(&self) -> Vec<String> {
        self.exchanges().into_iter().map(|(name, _)| name).collect()
    }
}

impl Dialer for ScriptedDialer {
    fn dial(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<Box<dyn Connection>, ConnectError> {
        let mut state = self.state.lock().unwrap();
        if port == PROBE_PORT {
            state.probe_attempts.push(timeout);
            if state.probe_ok {
                return Ok(Box::new(ScriptedConnection::idle()));
            }
            return Err(ConnectError {
                host: host.to_string(),
                port,
                source: None,
            });
        }

        state.telemetry_dials += 1;
        Ok(Box::new(ScriptedConnection::new(self.state.clone(), timeout)))
    }
}

struct ScriptedConnection {
    state: Option<Arc<Mutex<State>>>,
    timeout: Duration,
    request: Vec<u8>,
    response: Option<Cursor<Vec<u8>>>,
}

impl ScriptedConnection {
    fn new(state: Arc<Mutex<State>>, timeout: Duration) -> Self {
        Self {
            state: Some(state),
            timeout,
            request: Vec::new(),
            response: None,
        }
    }

    /// Connection for probe dials; the prober closes it without any I/O.
    fn idle() -> Self {
        Self {
            state: None,
            timeout: Duration::ZERO,
            request: Vec::new(),
            response: Some(Cursor::new(Vec::new())),
        }
    }

    fn resolve_response(&mut self) -> io::Result<()> {
        if self.response.is_some() {
            return Ok(());
        }
        let state = self
            .state
            .clone()
            .expect("telemetry connection without state");
        let request = String::from_utf8_lossy(&self.request).into_owned();
        let command = parse_command(&request);
        let mut state = state.lock().unwrap();
        state.exchanges.push((command.clone(), self.timeout));
        let script = state
            .scripts
            .get_mut(&command)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Script::Respond(Vec::new()));
        match script {
            Script::Respond(bytes) => {
                self.response = Some(Cursor::new(bytes));
                Ok(())
            }
            Script::Fail => Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "scripted connection failure",
            )),
        }
    }
}

impl Read for ScriptedConnection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.resolve_response()?;
        self.response
            .as_mut()
            .expect("response resolved above")
            .read(buf)
    }
}

impl Write for ScriptedConnection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.request.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn parse_command(request: &str) -> String {
    serde_json::from_str::<serde_json::Value>(request)
        .ok()
        .and_then(|v| v.get("command").and_then(|c| c.as_str()).map(String::from))
        .unwrap_or_else(|| "<unparsed>".to_string())
}
