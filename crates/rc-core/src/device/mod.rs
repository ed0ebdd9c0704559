//! Device domain models.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Role of an installation inside a sync domain.
///
/// Fixed per installation type and never negotiated at runtime. Only the
/// relay creates records in the shared store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceRole {
    Relay,
    Client,
}

impl DeviceRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceRole::Relay => "relay",
            DeviceRole::Client => "client",
        }
    }

    pub fn is_relay(self) -> bool {
        self == DeviceRole::Relay
    }

    /// Device hierarchy used by the simultaneity rule: relay outranks client.
    pub fn rank(self) -> u8 {
        match self {
            DeviceRole::Relay => 1,
            DeviceRole::Client => 0,
        }
    }
}

impl Display for DeviceRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relay" => Ok(DeviceRole::Relay),
            "client" => Ok(DeviceRole::Client),
            other => Err(format!("unknown device role: {other}")),
        }
    }
}
