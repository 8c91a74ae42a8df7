//! Settings files: explicit paths, the default location, and validation.

use std::fs;
use std::time::Duration;

use potlog::config::{self, Settings, DEFAULT_IDENTITY};
use potlog::error::PotError;
use tempfile::TempDir;

use crate::common::env::with_config_home;

#[test]
fn explicit_toml_file_overrides_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("potlog.toml");
    fs::write(
        &path,
        r#"
[device]
port = "/dev/ttyUSB0"
baud_rate = 115200

[bridge]
api_url = "http://raspberrypi.local:5000/"
interval_ms = 500
"#,
    )
    .unwrap();

    let settings = config::load_settings(Some(&path)).unwrap();

    assert_eq!(settings.device.port, "/dev/ttyUSB0");
    assert_eq!(settings.device.baud_rate, 115_200);
    assert_eq!(settings.device.identity, DEFAULT_IDENTITY);
    assert_eq!(settings.bridge.interval(), Duration::from_millis(500));
    assert_eq!(settings.bridge.api_timeout(), Duration::from_millis(500));
    assert_eq!(
        settings.readings_url(),
        "http://raspberrypi.local:5000/api/readings"
    );
}

#[test]
fn explicit_yaml_file_is_supported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("potlog.yml");
    fs::write(&path, "api:\n  bind: \"127.0.0.1:8080\"\nstore:\n  path: /var/lib/potlog/readings.db\n")
        .unwrap();

    let settings = config::load_settings(Some(&path)).unwrap();

    assert_eq!(settings.api.bind_addr().unwrap().port(), 8080);
    assert_eq!(
        settings.store.path,
        std::path::PathBuf::from("/var/lib/potlog/readings.db")
    );
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = config::load_settings(Some(&dir.path().join("nope.toml"))).unwrap_err();

    assert!(matches!(err, PotError::ConfigNotFound { .. }));
    assert!(err.suggestion().is_some());
}

#[test]
fn unknown_keys_are_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("potlog.toml");
    fs::write(&path, "[device]\nprot = \"/dev/ttyACM1\"\n").unwrap();

    assert!(matches!(
        config::load_settings(Some(&path)),
        Err(PotError::ConfigParse(_))
    ));
}

#[test]
fn out_of_range_values_are_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("potlog.toml");
    fs::write(&path, "[bridge]\ninterval_ms = 0\n").unwrap();

    match config::load_settings(Some(&path)) {
        Err(PotError::ConfigInvalid(message)) => assert!(message.contains("interval_ms")),
        other => panic!("expected ConfigInvalid, got {other:?}"),
    }
}

#[cfg(target_os = "linux")]
#[test]
fn default_location_is_optional() {
    let home = TempDir::new().unwrap();
    let _guard = with_config_home(&home.path().display().to_string());

    let settings = config::load_settings(None).unwrap();
    assert_eq!(settings, Settings::default());
}

#[cfg(target_os = "linux")]
#[test]
fn default_location_is_used_when_present() {
    let home = TempDir::new().unwrap();
    let _guard = with_config_home(&home.path().display().to_string());

    let path = config::default_config_path().unwrap();
    assert!(path.starts_with(home.path()));
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "[device]\nport = \"/dev/ttyACM7\"\n").unwrap();

    let settings = config::load_settings(None).unwrap();
    assert_eq!(settings.device.port, "/dev/ttyACM7");
}
