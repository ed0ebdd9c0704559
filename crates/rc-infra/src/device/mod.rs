//! Local device identity.
//!
//! The device ID is a UUID v4 stored as plain text in the data directory. It is
//! created on first start and never changes for the installation. The role
//! comes from configuration and is fixed per installation type.

mod storage;

use anyhow::Result;
use std::path::Path;
use tracing::info;

use rc_core::ids::DeviceId;
use rc_core::ports::DeviceIdentityPort;
use rc_core::DeviceRole;

pub struct LocalDeviceIdentity {
    device_id: DeviceId,
    role: DeviceRole,
}

impl LocalDeviceIdentity {
    /// Load the persisted ID, or mint and persist a new one.
    ///
    /// Fails on any I/O error: the app must not start without a stable identity.
    pub fn load_or_create(data_dir: &Path, role: DeviceRole) -> Result<Self> {
        let device_id = match storage::load_from_disk(data_dir)? {
            Some(id) => id,
            None => {
                let id = DeviceId::new(uuid::Uuid::new_v4().to_string());
                storage::save_to_disk(data_dir, &id)?;
                info!(device_id = %id, "Created new device identity");
                id
            }
        };
        Ok(Self { device_id, role })
    }
}

impl DeviceIdentityPort for LocalDeviceIdentity {
    fn current_device_id(&self) -> DeviceId {
        self.device_id.clone()
    }

    fn role(&self) -> DeviceRole {
        self.role
    }
}
