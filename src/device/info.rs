//! Connection parameters and port discovery records.

use std::time::Duration;

use serde::Serialize;

/// Where and how to open the instrument's serial port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// Port identifier, e.g. `/dev/ttyACM0` or `COM3`
    pub port: String,
    pub baud_rate: u32,
    /// Read timeout for one response line
    pub timeout: Duration,
    /// Delay after opening before the device is considered ready
    pub settle: Duration,
}

/// A serial port visible to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortInfo {
    /// Port name as accepted by `--port`
    pub name: String,
    /// Transport kind: usb, bluetooth, pci, unknown
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vid: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
}

impl PortInfo {
    /// One-line human description.
    pub fn describe(&self) -> String {
        let mut out = format!("{} ({})", self.name, self.kind);
        if let (Some(vid), Some(pid)) = (self.vid, self.pid) {
            out.push_str(&format!(" {vid:04x}:{pid:04x}"));
        }
        if let Some(product) = &self.product {
            out.push_str(&format!(" {product}"));
        }
        if let Some(serial) = &self.serial_number {
            out.push_str(&format!(" SN:{serial}"));
        }
        out
    }
}
