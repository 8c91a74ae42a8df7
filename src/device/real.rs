//! Real serial instrument implementation.
//!
//! This module wraps the `serialport` crate to provide the concrete
//! instrument used by `potlog bridge`.

use serialport::{SerialPort, SerialPortType};
use tracing::{debug, info, instrument, warn};

use super::info::{ConnectionOptions, PortInfo};
use super::line::Session;
use super::Instrument;
use crate::error::{PotError, Result};

/// Serial-attached instrument.
pub struct SerialInstrument {
    options: ConnectionOptions,
    session: Session<Box<dyn SerialPort>>,
}

impl SerialInstrument {
    /// Create a closed instrument handle; nothing is opened until `connect`.
    pub fn new(options: ConnectionOptions) -> Self {
        Self {
            options,
            session: Session::Closed,
        }
    }
}

impl Instrument for SerialInstrument {
    fn port_name(&self) -> &str {
        &self.options.port
    }

    fn is_connected(&self) -> bool {
        self.session.is_open()
    }

    #[instrument(skip(self), fields(port = %self.options.port, baud = self.options.baud_rate))]
    fn connect(&mut self) -> Result<()> {
        if self.session.is_open() {
            debug!("Already connected");
            return Ok(());
        }

        info!("Connecting to instrument");
        let port = serialport::new(&self.options.port, self.options.baud_rate)
            .timeout(self.options.timeout)
            .open()
            .map_err(|e| PotError::DeviceOpenFailed {
                port: self.options.port.clone(),
                reason: e.to_string(),
            })?;

        // Opening the port resets the Arduino
        std::thread::sleep(self.options.settle);
        self.session = Session::Open(port);
        info!("Connection established");
        Ok(())
    }

    fn query(&mut self, command: &str) -> Result<Option<String>> {
        debug!(command, "Querying instrument");
        self.session.exchange(command, self.options.timeout)
    }

    fn disconnect(&mut self) {
        if self.session.close() {
            info!(port = %self.options.port, "Disconnected from instrument");
        }
    }
}

impl Drop for SerialInstrument {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// List serial ports visible to the host.
pub fn list_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports().map_err(|e| {
        warn!(error = %e, "Serial port enumeration failed");
        PotError::Other(format!("Failed to enumerate serial ports: {e}"))
    })?;

    let mut result: Vec<PortInfo> = ports
        .into_iter()
        .map(|port| match port.port_type {
            SerialPortType::UsbPort(usb) => PortInfo {
                name: port.port_name,
                kind: "usb",
                vid: Some(usb.vid),
                pid: Some(usb.pid),
                manufacturer: usb.manufacturer,
                product: usb.product,
                serial_number: usb.serial_number,
            },
            other => PortInfo {
                name: port.port_name,
                kind: match other {
                    SerialPortType::BluetoothPort => "bluetooth",
                    SerialPortType::PciPort => "pci",
                    _ => "unknown",
                },
                vid: None,
                pid: None,
                manufacturer: None,
                product: None,
                serial_number: None,
            },
        })
        .collect();

    result.sort_by(|a, b| a.name.cmp(&b.name));
    debug!(count = result.len(), "Enumerated serial ports");
    Ok(result)
}
