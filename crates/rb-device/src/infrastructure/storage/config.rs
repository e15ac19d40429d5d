//! TOML-based configuration persistence for the device.
//!
//! Reads and writes [`DeviceConfig`] to the platform-appropriate file:
//! - Windows:  `%APPDATA%\RemoteBrain\device.toml`
//! - Linux:    `~/.config/remotebrain/device.toml`
//! - macOS:    `~/Library/Application Support/RemoteBrain/device.toml`
//!
//! Example file:
//!
//! ```toml
//! device_id = "5f0c7f4e-2d7b-4d36-9d0e-0b8f6c1e9a12"
//! device_name = "Kitchen tablet"
//! public_key = "kitchen-tablet"
//! agent_url = "ws://192.168.1.20:8765"
//!
//! [gesture]
//! cursor_speed = 1.5
//! scroll_gain = 2.0
//! ```
//!
//! # Why persist the device id?
//!
//! The host agent's trust registry is keyed by `device_id`.  A device that
//! changed its id on every launch would have to be re-approved every time,
//! so the first run generates a UUID and writes it back to disk.

use std::path::{Path, PathBuf};

use rb_core::GestureConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::infrastructure::network::DEFAULT_AGENT_URL;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema ─────────────────────────────────────────────────────────────

/// Device configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceConfig {
    /// Stable identifier presented to the agent.  Empty means "not yet assigned".
    #[serde(default)]
    pub device_id: String,
    /// Name shown to the host operator during pairing.
    #[serde(default = "default_device_name")]
    pub device_name: String,
    /// Opaque key label sent in `pair.request`.
    #[serde(default = "default_public_key")]
    pub public_key: String,
    /// WebSocket endpoint of the host agent.
    #[serde(default = "default_agent_url")]
    pub agent_url: String,
    /// Gesture tuning.
    #[serde(default)]
    pub gesture: GestureConfig,
}

fn default_device_name() -> String {
    "RemoteBrain device".to_string()
}
fn default_public_key() -> String {
    "remotebrain-device".to_string()
}
fn default_agent_url() -> String {
    DEFAULT_AGENT_URL.to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_id: String::new(),
            device_name: default_device_name(),
            public_key: default_public_key(),
            agent_url: default_agent_url(),
            gesture: GestureConfig::default(),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Resolves the default path of `device.toml`.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join("device.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads the config at `path`, returning defaults if the file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<DeviceConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(DeviceConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Persists `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(path: &Path, config: &DeviceConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads the config and makes sure it carries a device id.
///
/// A missing id is generated and written back so the next launch presents
/// the same identity to the agent.  Gesture values are sanitized on load.
pub fn load_or_create(path: &Path) -> Result<DeviceConfig, ConfigError> {
    let mut config = load_config(path)?;
    config.gesture = config.gesture.sanitized();
    if config.device_id.trim().is_empty() {
        config.device_id = Uuid::new_v4().to_string();
        save_config(path, &config)?;
        info!("assigned new device id {} ({})", config.device_id, path.display());
    }
    Ok(config)
}

/// Resolves the platform config base directory including the app subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("RemoteBrain"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("remotebrain"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("RemoteBrain")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("rb-device-test-{}", Uuid::new_v4()))
            .join("device.toml")
    }

    #[test]
    fn test_default_config_points_at_local_agent() {
        // Arrange / Act
        let cfg = DeviceConfig::default();

        // Assert
        assert_eq!(cfg.agent_url, "ws://127.0.0.1:8765");
        assert!(cfg.device_id.is_empty());
        assert_eq!(cfg.gesture, GestureConfig::default());
    }

    #[test]
    fn test_partial_toml_fills_in_defaults() {
        let cfg: DeviceConfig = toml::from_str(
            r#"
            device_name = "Tablet"

            [gesture]
            cursor_speed = 2.5
            "#,
        )
        .expect("parse");

        assert_eq!(cfg.device_name, "Tablet");
        assert_eq!(cfg.public_key, "remotebrain-device");
        assert_eq!(cfg.gesture.cursor_speed, 2.5);
        assert_eq!(cfg.gesture.scroll_gain, GestureConfig::default().scroll_gain);
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let path = scratch_path();

        let cfg = load_config(&path).expect("load");

        assert_eq!(cfg, DeviceConfig::default());
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let path = scratch_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "device_name = [").unwrap();

        let result = load_config(&path);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_or_create_persists_a_stable_device_id() {
        // Arrange
        let path = scratch_path();

        // Act
        let first = load_or_create(&path).expect("first load");
        let second = load_or_create(&path).expect("second load");

        // Assert
        assert!(Uuid::parse_str(&first.device_id).is_ok());
        assert_eq!(first.device_id, second.device_id);
    }

    #[test]
    fn test_load_or_create_clamps_cursor_speed() {
        let path = scratch_path();
        let cfg = DeviceConfig {
            device_id: "fixed".into(),
            gesture: GestureConfig {
                cursor_speed: 40.0,
                ..GestureConfig::default()
            },
            ..DeviceConfig::default()
        };
        save_config(&path, &cfg).unwrap();

        let loaded = load_or_create(&path).unwrap();

        assert_eq!(loaded.device_id, "fixed");
        assert_eq!(loaded.gesture.cursor_speed, rb_core::domain::gesture::MAX_CURSOR_SPEED);
    }
}
