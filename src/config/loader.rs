//! Settings file discovery and parsing (TOML or YAML).

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, trace};

use super::Settings;
use crate::error::{PotError, Result};

/// Settings file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format (.yaml, .yml).
    Yaml,
    /// TOML format (.toml).
    Toml,
}

impl ConfigFormat {
    /// Detect format from file extension.
    ///
    /// Returns `None` if the extension is not recognized.
    #[must_use]
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        trace!(extension = %ext, "Detecting config format from extension");
        match ext.to_lowercase().as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

/// Default settings location: `<config_dir>/potlog/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("potlog").join("config.toml"))
}

/// Load settings from an explicit file, the default location, or defaults.
///
/// An explicitly requested file must exist. The default location is
/// optional; when it is absent the built-in defaults are used.
///
/// # Errors
///
/// Returns an error if a file exists but cannot be read, parsed, or
/// validated, or if an explicit path is missing.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    if let Some(path) = explicit {
        return load_file(path);
    }

    match default_config_path() {
        Some(path) if path.is_file() => load_file(&path),
        _ => {
            debug!("No settings file found, using defaults");
            Ok(Settings::default())
        }
    }
}

/// Load and validate settings from a file.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();

    let format = ConfigFormat::from_extension(path).ok_or_else(|| {
        PotError::ConfigParse(format!(
            "Unknown config format for '{}': expected .yaml, .yml, or .toml",
            path.display()
        ))
    })?;
    debug!(format = ?format, "Detected config format");

    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PotError::ConfigNotFound {
                path: path.display().to_string(),
            }
        } else {
            PotError::Io(e)
        }
    })?;

    let settings = load_from_str(&content, format)?;
    info!("Settings loaded");
    Ok(settings)
}

/// Parse and validate settings from a string with a known format.
pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<Settings> {
    let settings: Settings = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(content)
            .map_err(|e| PotError::ConfigParse(format!("YAML: {e}")))?,
        ConfigFormat::Toml => {
            toml::from_str(content).map_err(|e| PotError::ConfigParse(format!("TOML: {e}")))?
        }
    };

    settings.validate()?;
    Ok(settings)
}
