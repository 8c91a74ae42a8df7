//! Error types for the pot logger: device, bridge, store, and configuration.

use thiserror::Error;

/// Primary error type for pot logger operations.
#[derive(Error, Debug)]
pub enum PotError {
    // Device errors
    #[error("Could not connect to {port}: {reason}")]
    DeviceOpenFailed { port: String, reason: String },

    #[error("Not connected to instrument")]
    NotConnected,

    #[error("Communication error during query '{command}': {reason}")]
    DeviceCommunication { command: String, reason: String },

    #[error("Connected to wrong instrument: expected '{expected}', got {}", display_identity(.actual))]
    WrongInstrument {
        expected: String,
        actual: Option<String>,
    },

    // Delivery errors
    #[error("Could not post to API at {url}: {reason}")]
    Delivery { url: String, reason: String },

    // Store errors
    #[error("Database error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Database file not found: {path}")]
    StoreMissing { path: String },

    // Configuration errors
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    #[error("Configuration parse error: {0}")]
    ConfigParse(String),

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    // Web server errors
    #[error("Web server failed to start on {addr}: {reason}")]
    WebServerFailed { addr: String, reason: String },

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

fn display_identity(actual: &Option<String>) -> String {
    actual
        .as_deref()
        .map_or_else(|| "no response".to_string(), |id| format!("'{id}'"))
}

impl PotError {
    /// Returns true if the error is recoverable by the user.
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DeviceOpenFailed { .. }
                | Self::WrongInstrument { .. }
                | Self::StoreMissing { .. }
                | Self::ConfigNotFound { .. }
                | Self::ConfigInvalid(_)
                | Self::WebServerFailed { .. }
        )
    }

    /// Returns a suggestion for how to fix the error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::DeviceOpenFailed { .. } => {
                Some("Check the USB cable, then run: potlog ports")
            }
            Self::WrongInstrument { .. } => {
                Some("Check that the sensor kit firmware is flashed and --port points at it")
            }
            Self::StoreMissing { .. } => Some("Run: potlog init-db"),
            Self::ConfigNotFound { .. } => Some("Pass an existing file with --config"),
            Self::WebServerFailed { .. } => Some("Use --bind to choose a free address"),
            _ => None,
        }
    }
}

/// Convenience type alias for Results using PotError.
pub type Result<T> = std::result::Result<T, PotError>;

/// Extension trait for adding context to errors.
pub trait ResultExt<T> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E: std::error::Error> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| PotError::Other(format!("{}: {e}", f().into())))
    }
}
