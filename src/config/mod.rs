//! Configuration for the bridge, the API server and the reading store.
//!
//! Settings come from built-in defaults, optionally overlaid by a TOML or
//! YAML file, and finally by command-line flags (applied in `main`).

mod loader;
mod settings;

pub use loader::{default_config_path, load_file, load_from_str, load_settings, ConfigFormat};
pub use settings::{
    ApiSettings, BridgeSettings, DeviceSettings, Settings, StoreSettings, DEFAULT_API_TIMEOUT_MS,
    DEFAULT_API_URL, DEFAULT_BAUD_RATE, DEFAULT_BIND, DEFAULT_DEVICE_TIMEOUT_MS,
    DEFAULT_IDENTITY, DEFAULT_INTERVAL_MS, DEFAULT_PORT, DEFAULT_SETTLE_MS, DEFAULT_STORE_PATH,
};
