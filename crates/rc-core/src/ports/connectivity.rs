use tokio::sync::watch;

/// Source of online/offline transitions. The orchestrator subscribes, it never polls.
///
/// Receivers are woken on transitions only. A receiver that sees the same
/// value twice has missed a drop and a recovery in between.
pub trait ConnectivityPort: Send + Sync {
    fn subscribe(&self) -> watch::Receiver<bool>;
}
