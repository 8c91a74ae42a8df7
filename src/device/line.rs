//! Newline-terminated command/response exchange over a byte channel.

use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use tracing::trace;

use crate::error::{PotError, Result};

/// A device session: either open over a channel, or closed.
///
/// Exchanges are only possible in the `Open` state; a closed session
/// answers every query with `PotError::NotConnected` without I/O.
#[derive(Debug)]
pub enum Session<C> {
    Open(C),
    Closed,
}

impl<C> Default for Session<C> {
    fn default() -> Self {
        Self::Closed
    }
}

impl<C: Read + Write> Session<C> {
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Open(_))
    }

    /// Write `command` as a line and read one response line.
    ///
    /// Returns `Ok(None)` if nothing (or only whitespace) arrived before
    /// `timeout`.
    pub fn exchange(&mut self, command: &str, timeout: Duration) -> Result<Option<String>> {
        let Self::Open(channel) = self else {
            return Err(PotError::NotConnected);
        };

        let comm_err = |e: io::Error| PotError::DeviceCommunication {
            command: command.to_string(),
            reason: e.to_string(),
        };

        write_line(channel, command).map_err(comm_err)?;
        let raw = read_line(channel, timeout).map_err(comm_err)?;
        trace!(command, bytes = raw.len(), "Read response line");
        decode_response(command, &raw)
    }

    /// Close the session. Returns true if it was open.
    pub fn close(&mut self) -> bool {
        matches!(std::mem::take(self), Self::Open(_))
    }
}

/// Write command bytes followed by `\n`, then flush.
pub fn write_line<W: Write>(writer: &mut W, command: &str) -> io::Result<()> {
    let mut line = Vec::with_capacity(command.len() + 1);
    line.extend_from_slice(command.as_bytes());
    line.push(b'\n');
    writer.write_all(&line)?;
    writer.flush()
}

/// Read bytes up to and including `\n`.
///
/// Stops early on EOF, on a read timeout from the channel, or once
/// `timeout` has elapsed overall, returning whatever arrived so far.
pub fn read_line<R: Read>(reader: &mut R, timeout: Duration) -> io::Result<Vec<u8>> {
    let deadline = Instant::now() + timeout;
    let mut line = Vec::new();
    let mut byte = [0u8; 1];

    loop {
        match reader.read(&mut byte) {
            Ok(0) => break,
            Ok(_) => {
                line.push(byte[0]);
                if byte[0] == b'\n' {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::TimedOut => break,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
        if Instant::now() >= deadline {
            break;
        }
    }

    Ok(line)
}

/// Decode a raw response line as UTF-8 and strip whitespace and line
/// terminators. A blank response is `None`.
pub fn decode_response(command: &str, raw: &[u8]) -> Result<Option<String>> {
    let text = std::str::from_utf8(raw).map_err(|e| PotError::DeviceCommunication {
        command: command.to_string(),
        reason: format!("response is not valid UTF-8: {e}"),
    })?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(trimmed.to_string()))
    }
}
