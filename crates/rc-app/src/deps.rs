//! # Sync dependencies
//!
//! Parameter grouping for orchestrator construction.
//!
//! **Note**: This is NOT a Builder pattern.
//! - No build steps
//! - No default values
//! - Just parameter grouping

use std::sync::Arc;

use rc_core::ports::*;

/// All ports the sync use cases depend on. Every field is required.
#[derive(Clone)]
pub struct SyncDeps {
    // Storage
    pub records: Arc<dyn LocalRecordStorePort>,
    pub operations: Arc<dyn PendingOperationStorePort>,
    pub aliases: Arc<dyn CanonicalAliasPort>,

    // Remote
    pub shared: Arc<dyn SharedStorePort>,
    pub connectivity: Arc<dyn ConnectivityPort>,

    // Device
    pub identity: Arc<dyn DeviceIdentityPort>,

    // System
    pub clock: Arc<dyn ClockPort>,
    pub hash: Arc<dyn ContentHashPort>,
}
