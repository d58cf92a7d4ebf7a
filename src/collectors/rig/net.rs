//! Address resolution and TCP connection establishment
//!
//! Every exchange with a rig controller happens over a fresh connection, so
//! this module only knows how to produce one connected stream: resolve the
//! host/port pair, walk the candidate addresses in resolution order, and hand
//! back the first live socket. Retrying a failed dial is the caller's job.

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::debug;
use thiserror::Error;

/// No candidate address could be reached within the attempt's timeout.
///
/// Carries the last OS-level error observed, if any; resolution that yields no
/// candidates at all leaves `source` empty.
#[derive(Debug, Error)]
#[error("no reachable address for {host}:{port}")]
pub struct ConnectError {
    pub host: String,
    pub port: u16,
    #[source]
    pub source: Option<std::io::Error>,
}

/// A live, timeout-armed byte stream to a rig controller.
pub trait Connection: Read + Write + Send {}

impl<T: Read + Write + Send> Connection for T {}

/// Connection factory seam.
///
/// The poller only ever asks for "a connection to host:port within this
/// timeout", which keeps the whole retry engine testable against stub dialers
/// with canned responses and call counting.
pub trait Dialer: Send + Sync {
    fn dial(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<Box<dyn Connection>, ConnectError>;
}

/// Production dialer over the OS resolver and blocking TCP sockets.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpDialer;

impl Dialer for TcpDialer {
    fn dial(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<Box<dyn Connection>, ConnectError> {
        let fail = |source| ConnectError {
            host: host.to_string(),
            port,
            source,
        };

        let candidates = (host, port)
            .to_socket_addrs()
            .map_err(|err| fail(Some(err)))?;

        let mut last_err = None;
        for addr in candidates {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    // The dial timeout also governs the exchange that follows.
                    if let Err(err) = stream
                        .set_read_timeout(Some(timeout))
                        .and_then(|()| stream.set_write_timeout(Some(timeout)))
                    {
                        debug!("failed to arm timeouts on {addr}: {err}");
                        last_err = Some(err);
                        continue;
                    }
                    return Ok(Box::new(stream));
                }
                Err(err) => {
                    debug!("connect to candidate {addr} failed: {err}");
                    last_err = Some(err);
                }
            }
        }

        Err(fail(last_err))
    }
}
