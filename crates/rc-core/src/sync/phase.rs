use serde::{Deserialize, Serialize};

/// Sync orchestrator phase
///
/// Pure state definition plus transition validation. The control loop in
/// `rc-app` drives the transitions and reports them to observers.
///
/// ```text
/// Idle ──→ Pushing ──→ Idle                      (relay)
///   │
///   └───→ Pulling ──→ Reconciling ──→ Idle       (client, relay deletes-only)
///
/// Any phase ──→ Idle   (abort: disconnect, cancellation)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestratorPhase {
    /// Nothing in flight
    Idle,

    /// Draining the offline queue towards the shared store
    Pushing,

    /// Fetching a snapshot from the shared store
    Pulling,

    /// Applying a pulled snapshot to the local store
    Reconciling,
}

impl Default for OrchestratorPhase {
    fn default() -> Self {
        Self::Idle
    }
}

impl OrchestratorPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pushing => "pushing",
            Self::Pulling => "pulling",
            Self::Reconciling => "reconciling",
        }
    }

    pub fn is_active(self) -> bool {
        !matches!(self, Self::Idle)
    }

    pub fn start_pushing(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::Pushing),
            _ => None,
        }
    }

    pub fn start_pulling(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::Pulling),
            _ => None,
        }
    }

    pub fn on_pulled(self) -> Option<Self> {
        match self {
            Self::Pulling => Some(Self::Reconciling),
            _ => None,
        }
    }

    /// Normal completion of a cycle.
    pub fn finish(self) -> Option<Self> {
        match self {
            Self::Pushing | Self::Reconciling => Some(Self::Idle),
            _ => None,
        }
    }

    pub fn abort(self) -> Self {
        Self::Idle
    }
}

impl std::fmt::Display for OrchestratorPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
