//! ID type wrappers for type safety.

mod id_macro;

pub mod canonical;
pub mod device_id;

pub use canonical::{CanonicalId, OperationId};
pub use device_id::DeviceId;
