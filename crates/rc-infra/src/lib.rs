//! Infrastructure adapters for the `rc-core` ports.

pub mod connectivity;
pub mod db;
pub mod device;
pub mod hash;
pub mod shared_store;
pub mod time;

pub use connectivity::WatchConnectivity;
pub use device::LocalDeviceIdentity;
pub use hash::{hasher_for, Blake3Hasher, Sha256Hasher};
pub use shared_store::InMemorySharedStore;
pub use time::SystemClock;
