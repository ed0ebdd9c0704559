use crate::device::DeviceRole;
use crate::ids::DeviceId;

/// Identity of this installation. Both values are fixed for its lifetime.
pub trait DeviceIdentityPort: Send + Sync {
    fn current_device_id(&self) -> DeviceId;

    fn role(&self) -> DeviceRole;
}
