//! Device abstraction layer for line-oriented serial instruments.
//!
//! This module provides a trait-based abstraction over the real serial
//! instrument and a scripted mock, enabling the bridge to be tested
//! without hardware.

mod info;
mod line;
pub mod mock;
mod real;

pub use info::{ConnectionOptions, PortInfo};
pub use line::{decode_response, read_line, write_line, Session};
pub use real::{list_ports, SerialInstrument};

use crate::error::Result;

/// Command asking the instrument to identify itself.
pub const IDENTITY_QUERY: &str = "*IDN?";

/// Command asking the instrument for one potentiometer sample.
pub const MEASURE_QUERY: &str = "MEAS:POT?";

/// Core instrument operations.
///
/// # Implementation Notes
///
/// - `query` must fail with `PotError::NotConnected` before `connect`
///   succeeds, without touching the channel
/// - A response that times out or is blank is `Ok(None)`, which is
///   distinct from a communication error
/// - `disconnect` is idempotent
pub trait Instrument {
    /// Port identifier the instrument is attached to.
    fn port_name(&self) -> &str;

    /// Check whether the session is open.
    fn is_connected(&self) -> bool;

    /// Open the session.
    ///
    /// # Errors
    ///
    /// Returns `DeviceOpenFailed` if the channel cannot be opened.
    fn connect(&mut self) -> Result<()>;

    /// Send one command line and read one response line.
    ///
    /// # Errors
    ///
    /// Returns `NotConnected` if the session is closed, or
    /// `DeviceCommunication` carrying the command if the channel fails.
    fn query(&mut self, command: &str) -> Result<Option<String>>;

    /// Close the session if it is open.
    fn disconnect(&mut self);
}
