//! Trusted-device registry.
//!
//! The registry file is plain JSON so an operator can inspect or edit it:
//!
//! ```json
//! {
//!   "trusted_devices": [
//!     { "device_id": "5f0c…", "device_name": "Tablet", "public_key": "tablet" }
//!   ]
//! }
//! ```
//!
//! [`JsonTrustStore`] loads the file once at startup and rewrites it every
//! time a device is trusted.  A missing file is an empty registry.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::application::{RegistryError, TrustStore};
use crate::domain::TrustedDevice;

#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    trusted_devices: Vec<TrustedDevice>,
}

/// Replaces the entry with the same `device_id`, or appends.
fn upsert(devices: &mut Vec<TrustedDevice>, device: TrustedDevice) {
    match devices.iter_mut().find(|d| d.device_id == device.device_id) {
        Some(existing) => *existing = device,
        None => devices.push(device),
    }
}

// ── JSON file store ───────────────────────────────────────────────────────────

/// Registry persisted to a JSON file.
#[derive(Debug)]
pub struct JsonTrustStore {
    path: PathBuf,
    devices: Vec<TrustedDevice>,
}

impl JsonTrustStore {
    /// Loads the registry at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Io`] for file-system errors other than "not
    /// found" and [`RegistryError::Parse`] if the file is not valid JSON.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let path = path.into();
        let devices = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str::<RegistryFile>(&content)?.trusted_devices,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(RegistryError::Io { path, source }),
        };
        info!("loaded {} trusted device(s) from {}", devices.len(), path.display());
        Ok(Self { path, devices })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), RegistryError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| RegistryError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let file = RegistryFile {
            trusted_devices: self.devices.clone(),
        };
        let content = serde_json::to_string_pretty(&file)?;
        std::fs::write(&self.path, content).map_err(|source| RegistryError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl TrustStore for JsonTrustStore {
    fn is_trusted(&self, device_id: &str) -> bool {
        self.devices.iter().any(|d| d.device_id == device_id)
    }

    fn trust(&mut self, device: TrustedDevice) -> Result<(), RegistryError> {
        upsert(&mut self.devices, device);
        self.save()
    }

    fn devices(&self) -> Vec<TrustedDevice> {
        self.devices.clone()
    }
}

// ── In-memory store ───────────────────────────────────────────────────────────

/// Registry that never touches the disk.
#[derive(Debug, Default)]
pub struct InMemoryTrustStore {
    devices: Vec<TrustedDevice>,
}

impl InMemoryTrustStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_devices(devices: impl IntoIterator<Item = TrustedDevice>) -> Self {
        let mut store = Self::new();
        for device in devices {
            upsert(&mut store.devices, device);
        }
        store
    }
}

impl TrustStore for InMemoryTrustStore {
    fn is_trusted(&self, device_id: &str) -> bool {
        self.devices.iter().any(|d| d.device_id == device_id)
    }

    fn trust(&mut self, device: TrustedDevice) -> Result<(), RegistryError> {
        upsert(&mut self.devices, device);
        Ok(())
    }

    fn devices(&self) -> Vec<TrustedDevice> {
        self.devices.clone()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("rb-agent-test-{}", uuid::Uuid::new_v4()))
            .join("trusted_devices.json")
    }

    fn device(id: &str, name: &str) -> TrustedDevice {
        TrustedDevice {
            device_id: id.into(),
            device_name: name.into(),
            public_key: "k".into(),
        }
    }

    #[test]
    fn test_missing_file_is_empty_registry() {
        // Arrange / Act
        let store = JsonTrustStore::load(scratch_path()).unwrap();

        // Assert
        assert!(store.devices().is_empty());
        assert!(!store.is_trusted("anyone"));
    }

    #[test]
    fn test_trust_persists_across_reload() {
        // Arrange
        let path = scratch_path();
        let mut store = JsonTrustStore::load(&path).unwrap();

        // Act
        store.trust(device("tab-1", "Tablet")).unwrap();
        let reloaded = JsonTrustStore::load(&path).unwrap();

        // Assert
        assert!(reloaded.is_trusted("tab-1"));
        assert_eq!(reloaded.devices(), vec![device("tab-1", "Tablet")]);
    }

    #[test]
    fn test_file_uses_trusted_devices_key() {
        let path = scratch_path();
        let mut store = JsonTrustStore::load(&path).unwrap();
        store.trust(device("tab-1", "Tablet")).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

        assert_eq!(raw["trusted_devices"][0]["device_id"], "tab-1");
        assert_eq!(raw["trusted_devices"][0]["device_name"], "Tablet");
    }

    #[test]
    fn test_retrusting_replaces_entry() {
        let mut store = InMemoryTrustStore::new();

        store.trust(device("tab-1", "Old")).unwrap();
        store.trust(device("tab-1", "New")).unwrap();

        assert_eq!(store.devices(), vec![device("tab-1", "New")]);
    }

    #[test]
    fn test_corrupt_file_is_parse_error() {
        let path = scratch_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not json").unwrap();

        let result = JsonTrustStore::load(&path);

        assert!(matches!(result, Err(RegistryError::Parse(_))));
    }
}
