//! Request/response framing.
//!
//! One exchange writes a command line (or a bracketed command list) and
//! collects lines until `OK` or an `ACK` error line. A stall past the
//! deadline discards the connection, since the next read could otherwise
//! pick up the tail of this response.

use std::time::Duration;

use mpdwire_core::ack::{ACK_MARKER, OK_MARKER};
use mpdwire_core::{Ack, Error, Result};
use tracing::{debug, trace, warn};

use crate::codec::CommandList;
use crate::transport::{is_timeout, Connection};

/// Lines of one response, without the terminator.
pub type RawResponse = Vec<String>;

/// Execute a single command line.
pub fn execute(conn: &mut Connection, line: &str, timeout: Duration) -> Result<RawResponse> {
    let mut payload = String::with_capacity(line.len() + 1);
    payload.push_str(line);
    payload.push('\n');

    exchange(conn, line, &payload, timeout)
}

/// Execute a command list as one batch. The response is returned unnormalized.
pub fn execute_batch(
    conn: &mut Connection,
    batch: &CommandList,
    timeout: Duration,
) -> Result<RawResponse> {
    let label = format!("command list of {}", batch.len());
    exchange(conn, &label, &batch.render(), timeout)
}

fn exchange(
    conn: &mut Connection,
    label: &str,
    payload: &str,
    timeout: Duration,
) -> Result<RawResponse> {
    if timeout.is_zero() {
        return Err(Error::InvalidArgument(format!(
            "'{label}' needs a non-zero deadline"
        )));
    }

    if !conn.is_established() {
        debug!("Connection is not established, connecting before '{}'", label);
        conn.establish()
            .map_err(|e| Error::ConnectionNotEstablished(e.to_string()))?;
    }

    conn.set_deadline(timeout)?;

    trace!("-> {}", payload.trim_end());
    if let Err(e) = conn.write_all(payload) {
        warn!("Failed to write '{}': {}", label, e);
        // Part of the line may already be on the wire.
        let _ = conn.close();
        return Err(Error::WriteFailed(e.to_string()));
    }

    let response = read_response(conn, label, timeout)?;

    if let Err(e) = conn.reset_deadline() {
        let _ = conn.close();
        return Err(e);
    }
    Ok(response)
}

fn read_response(conn: &mut Connection, label: &str, timeout: Duration) -> Result<RawResponse> {
    let mut response = Vec::new();

    loop {
        let line = match conn.read_line() {
            Ok(Some(line)) => line,
            Ok(None) => {
                warn!("Daemon closed the connection during '{}'", label);
                let _ = conn.close();
                return Err(Error::ConnectionFailed(
                    "connection closed by daemon before the response completed".to_string(),
                ));
            }
            Err(e) if is_timeout(&e) => {
                warn!("'{}' timed out after {:?}, dropping connection", label, timeout);
                let _ = conn.close();
                return Err(Error::Timeout {
                    command: label.to_string(),
                    after: timeout,
                });
            }
            Err(e) => {
                let _ = conn.close();
                return Err(Error::Io(e));
            }
        };

        let line = line.trim();
        trace!("<- {}", line);

        if line.is_empty() {
            continue;
        }

        if line == OK_MARKER {
            return Ok(response);
        }

        if line.starts_with(ACK_MARKER) {
            if let Some(ack) = Ack::parse(line) {
                warn!("'{}' failed: {}", label, ack);
                // The daemon is ready for the next command after an ACK.
                if let Err(e) = conn.reset_deadline() {
                    let _ = conn.close();
                    return Err(e);
                }
                return Err(Error::CommandFailed(ack));
            }
        }

        response.push(line.to_string());
    }
}
