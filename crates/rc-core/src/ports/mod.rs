//! Port interfaces for the application layer
//!
//! Ports define the contract between the sync use cases and infrastructure
//! implementations. The local record store, the shared store, the connectivity
//! signal and the UI observers all live behind these traits so that the
//! reconciliation logic never depends on a concrete backend.
//!
//! ## Port Placement Guidelines
//!
//! Before adding a new port here, ask:
//!
//! 1. **Does this port represent a capability the sync core needs?**
//! 2. **Will it be depended upon by more than one use case?**
//! 3. **Is it implemented by the infrastructure layer or the embedding app?**
//!
//! If all three answers are **yes**, place it in `rc-core/ports`.

mod alias;
mod clock;
mod connectivity;
pub mod device_identity;
pub mod errors;
mod hash;
mod observer;
mod operation_store;
mod record_store;
mod shared_store;

pub use alias::CanonicalAliasPort;
pub use clock::ClockPort;
pub use connectivity::ConnectivityPort;
pub use device_identity::DeviceIdentityPort;
pub use errors::{RecordStoreError, SharedStoreError};
pub use hash::ContentHashPort;
pub use observer::SyncObserverPort;
pub use operation_store::PendingOperationStorePort;
pub use record_store::LocalRecordStorePort;
pub use shared_store::{PullBatch, RemoteChangeNotice, SharedStorePort};
