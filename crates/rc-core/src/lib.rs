//! # rc-core
//!
//! Core domain models and reconciliation rules for RelayClip.
//!
//! This crate contains pure business logic without any infrastructure dependencies.
//! Everything that touches the network, the disk or the clock is reached through
//! the traits in [`ports`].

// Public module exports
pub mod canonical;
pub mod config;
pub mod conflict;
pub mod correlation;
pub mod device;
pub mod error;
pub mod fingerprint;
pub mod ids;
pub mod operation;
pub mod ports;
pub mod record;
pub mod retry;
pub mod sync;

// Re-export commonly used types at the crate root
pub use canonical::CanonicalAlias;
pub use config::SyncConfig;
pub use conflict::ConflictOutcome;
pub use correlation::{CorrelationCandidate, HandoffPayload, MatchResult, SourceHint};
pub use device::DeviceRole;
pub use error::SyncError;
pub use fingerprint::{ContentFingerprint, HashAlgorithm};
pub use ids::{CanonicalId, DeviceId, OperationId};
pub use operation::{OperationType, PendingOperation};
pub use record::{ClipboardContent, ClipboardRecord, ContentType, SyncState};
pub use retry::RetryPolicy;
pub use sync::{ConflictReport, OrchestratorPhase, ReconcileMode, ReconciliationResult};
