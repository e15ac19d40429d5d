//! Trusted-device record.

use serde::{Deserialize, Serialize};

/// A device the host operator approved with a pairing code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedDevice {
    pub device_id: String,
    pub device_name: String,
    /// Opaque key label the device presented in `pair.request`.
    pub public_key: String,
}
