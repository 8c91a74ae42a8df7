//! Runtime settings for the bridge, the API server and the store.
//!
//! Every field has a default matching the stock sensor-kit setup, so a
//! missing settings file (or a partial one) is always valid.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::device::ConnectionOptions;
use crate::error::{PotError, Result};

/// Serial port the Arduino enumerates as on a Raspberry Pi.
pub const DEFAULT_PORT: &str = "/dev/ttyACM0";
pub const DEFAULT_BAUD_RATE: u32 = 9600;
pub const DEFAULT_DEVICE_TIMEOUT_MS: u64 = 1000;
/// The Arduino resets when the port is opened; give it time to boot.
pub const DEFAULT_SETTLE_MS: u64 = 2000;
pub const DEFAULT_IDENTITY: &str = "ArduinoSensorKit,v1.0,SN:SK12345";
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_INTERVAL_MS: u64 = 2000;
pub const DEFAULT_API_TIMEOUT_MS: u64 = 500;
pub const DEFAULT_BIND: &str = "0.0.0.0:5000";
pub const DEFAULT_STORE_PATH: &str = "readings.db";

/// Complete settings for all three roles.
///
/// # Example TOML
///
/// ```toml
/// [device]
/// port = "/dev/ttyUSB0"
///
/// [bridge]
/// interval_ms = 5000
///
/// [store]
/// path = "/var/lib/potlog/readings.db"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub device: DeviceSettings,
    pub bridge: BridgeSettings,
    pub api: ApiSettings,
    pub store: StoreSettings,
}

/// Serial link to the instrument.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceSettings {
    pub port: String,
    pub baud_rate: u32,
    /// Read timeout for a single response line.
    pub timeout_ms: u64,
    /// Delay after opening the port before the device is queried.
    pub settle_ms: u64,
    /// Expected `*IDN?` response.
    pub identity: String,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_ms: DEFAULT_DEVICE_TIMEOUT_MS,
            settle_ms: DEFAULT_SETTLE_MS,
            identity: DEFAULT_IDENTITY.to_string(),
        }
    }
}

impl DeviceSettings {
    /// Connection parameters for opening the serial port.
    pub fn connection_options(&self) -> ConnectionOptions {
        ConnectionOptions {
            port: self.port.clone(),
            baud_rate: self.baud_rate,
            timeout: Duration::from_millis(self.timeout_ms),
            settle: Duration::from_millis(self.settle_ms),
        }
    }
}

/// Poll loop and delivery target.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeSettings {
    /// Base URL of the reading store API (without `/api/readings`).
    pub api_url: String,
    pub interval_ms: u64,
    pub api_timeout_ms: u64,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            interval_ms: DEFAULT_INTERVAL_MS,
            api_timeout_ms: DEFAULT_API_TIMEOUT_MS,
        }
    }
}

impl BridgeSettings {
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub const fn api_timeout(&self) -> Duration {
        Duration::from_millis(self.api_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiSettings {
    pub bind: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

impl ApiSettings {
    /// Parse the bind address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.bind.parse().map_err(|e| {
            PotError::ConfigInvalid(format!("api.bind '{}' is not a socket address: {e}", self.bind))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreSettings {
    pub path: PathBuf,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_STORE_PATH),
        }
    }
}

impl Settings {
    /// Validate value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        trace!("Validating settings");

        if self.device.port.trim().is_empty() {
            return Err(PotError::ConfigInvalid("device.port must not be empty".into()));
        }
        if self.device.baud_rate == 0 {
            return Err(PotError::ConfigInvalid("device.baud_rate must be positive".into()));
        }
        if self.device.timeout_ms == 0 {
            return Err(PotError::ConfigInvalid("device.timeout_ms must be positive".into()));
        }
        if self.device.identity.trim().is_empty() {
            return Err(PotError::ConfigInvalid("device.identity must not be empty".into()));
        }
        // The HTTP client is built without a TLS backend
        if !self.bridge.api_url.starts_with("http://") {
            return Err(PotError::ConfigInvalid(format!(
                "bridge.api_url '{}' must start with http://",
                self.bridge.api_url
            )));
        }
        if self.bridge.interval_ms == 0 {
            return Err(PotError::ConfigInvalid("bridge.interval_ms must be positive".into()));
        }
        if self.bridge.api_timeout_ms == 0 {
            return Err(PotError::ConfigInvalid(
                "bridge.api_timeout_ms must be positive".into(),
            ));
        }
        self.api.bind_addr()?;
        if self.store.path.as_os_str().is_empty() {
            return Err(PotError::ConfigInvalid("store.path must not be empty".into()));
        }

        debug!("Settings validated");
        Ok(())
    }

    /// Full URL of the append endpoint.
    pub fn readings_url(&self) -> String {
        format!("{}/api/readings", self.bridge.api_url.trim_end_matches('/'))
    }
}
