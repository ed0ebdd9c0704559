//! RelayClip application layer
//!
//! Use cases on top of the `rc-core` ports: the offline operation queue, the
//! canonical ID resolver, the reconciliation engine and the sync orchestrator
//! that drives them from a single control loop.

pub mod deps;
pub mod observers;
pub mod orchestrator;
pub mod queue;
pub mod reconcile;
pub mod resolver;

pub use deps::SyncDeps;
pub use observers::SyncObservers;
pub use orchestrator::{CaptureOutcome, OrchestratorSettings, SyncHandle, SyncOrchestrator};
pub use queue::{DrainOutcome, DrainReport, EnqueueOutcome, OfflineOperationQueue, OperationExecutor};
pub use reconcile::ReconciliationEngine;
pub use resolver::{CanonicalIdResolver, MergeOutcome, Resolution};

#[cfg(test)]
pub(crate) mod test_support;
