use serde::{Deserialize, Serialize};

use crate::fingerprint::ContentFingerprint;
use crate::ids::DeviceId;
use crate::record::ClipboardContent;

/// Where an observation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceHint {
    LocalCopy,
    HandoffReceive,
    SharedStorePull,
}

/// Payload delivered by the device-to-device handoff transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoffPayload {
    pub content: ClipboardContent,
    /// Sender-side observation time, epoch milliseconds.
    pub timestamp: i64,
    pub source_device: Option<DeviceId>,
}

/// An observation that has not been assigned a canonical ID yet.
///
/// Lives only until the resolver turns it into a new or matched record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationCandidate {
    pub content: ClipboardContent,
    pub fingerprint: ContentFingerprint,
    pub received_at: i64,
    pub source: SourceHint,
    pub source_device: Option<DeviceId>,
}

impl CorrelationCandidate {
    pub fn local_copy(content: ClipboardContent, fingerprint: ContentFingerprint, now_ms: i64) -> Self {
        Self {
            content,
            fingerprint,
            received_at: now_ms,
            source: SourceHint::LocalCopy,
            source_device: None,
        }
    }

    pub fn from_handoff(payload: HandoffPayload, fingerprint: ContentFingerprint) -> Self {
        Self {
            content: payload.content,
            fingerprint,
            received_at: payload.timestamp,
            source: SourceHint::HandoffReceive,
            source_device: payload.source_device,
        }
    }
}
