use anyhow::{anyhow, Context, Result};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use rc_core::ids::CanonicalId;
use rc_core::{ClipboardContent, HandoffPayload};

use super::CaptureOutcome;

type Reply<T> = oneshot::Sender<Result<T>>;

pub(crate) enum SyncCommand {
    LocalCopy {
        content: ClipboardContent,
        reply: Reply<CaptureOutcome>,
    },
    Handoff {
        payload: HandoffPayload,
        reply: Reply<CaptureOutcome>,
    },
    Edit {
        canonical_id: CanonicalId,
        content: ClipboardContent,
        reply: Reply<()>,
    },
    Delete {
        canonical_id: CanonicalId,
        reply: Reply<()>,
    },
    SetForeground {
        foreground: bool,
        reply: Reply<()>,
    },
    AppActivated {
        reply: Reply<()>,
    },
    RequestSync {
        reply: Reply<()>,
    },
}

/// Cloneable entry point into a running [`SyncOrchestrator`](super::SyncOrchestrator).
///
/// Every call is queued into the orchestrator's control loop and resolves
/// once the loop has finished handling it.
#[derive(Clone)]
pub struct SyncHandle {
    commands: mpsc::Sender<SyncCommand>,
    shutdown: CancellationToken,
}

impl SyncHandle {
    pub(crate) fn new(commands: mpsc::Sender<SyncCommand>, shutdown: CancellationToken) -> Self {
        Self { commands, shutdown }
    }

    /// The user copied something on this device.
    pub async fn record_local_copy(&self, content: ClipboardContent) -> Result<CaptureOutcome> {
        self.call(|reply| SyncCommand::LocalCopy { content, reply }).await
    }

    /// Content arrived over the proximity handoff channel.
    pub async fn receive_handoff(&self, payload: HandoffPayload) -> Result<CaptureOutcome> {
        self.call(|reply| SyncCommand::Handoff { payload, reply }).await
    }

    pub async fn edit(&self, canonical_id: CanonicalId, content: ClipboardContent) -> Result<()> {
        self.call(|reply| SyncCommand::Edit {
            canonical_id,
            content,
            reply,
        })
        .await
    }

    pub async fn delete(&self, canonical_id: CanonicalId) -> Result<()> {
        self.call(|reply| SyncCommand::Delete { canonical_id, reply })
            .await
    }

    /// Periodic pulls only run while the app is in the foreground.
    pub async fn set_foreground(&self, foreground: bool) -> Result<()> {
        self.call(|reply| SyncCommand::SetForeground { foreground, reply })
            .await
    }

    pub async fn app_activated(&self) -> Result<()> {
        self.call(|reply| SyncCommand::AppActivated { reply }).await
    }

    /// Run one push/pull cycle now.
    pub async fn request_sync(&self) -> Result<()> {
        self.call(|reply| SyncCommand::RequestSync { reply }).await
    }

    /// Stop the control loop. In-flight work is abandoned between records.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    async fn call<T>(&self, make: impl FnOnce(Reply<T>) -> SyncCommand) -> Result<T> {
        if self.shutdown.is_cancelled() {
            return Err(anyhow!("sync orchestrator has been shut down"));
        }
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .await
            .map_err(|_| anyhow!("sync orchestrator is not running"))?;
        rx.await.context("sync orchestrator dropped the request")?
    }
}
