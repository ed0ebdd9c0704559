mod phase;
mod result;

pub use phase::OrchestratorPhase;
pub use result::{ConflictReport, ReconcileMode, ReconciliationResult};
