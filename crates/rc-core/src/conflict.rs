//! Ordered conflict-resolution rule chain.
//!
//! Applied only when both the local and the remote copy changed since the
//! last common sync point. Rules run in order until one decides:
//!
//! 1. content identity (same fingerprint → not a real conflict)
//! 2. device hierarchy inside the simultaneity window (relay beats client)
//! 3. recency (later `last_modified` wins)
//! 4. completeness (longer content wins, then larger fingerprint)
//!
//! Rule 4 is a total order over distinct fingerprints, so
//! [`ConflictOutcome::ConflictUnresolved`] cannot be produced by well-formed
//! input. Callers still handle it.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::record::ClipboardRecord;

/// Simultaneity window: edits closer than this are treated as concurrent.
pub const CONFLICT_WINDOW_MS: i64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictOutcome {
    LocalWins,
    CloudWins,
    Merged,
    ConflictUnresolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictRule {
    ContentIdentity,
    DeviceHierarchy,
    Recency,
    Completeness,
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictDecision {
    pub outcome: ConflictOutcome,
    pub rule: ConflictRule,
}

impl ConflictDecision {
    fn new(outcome: ConflictOutcome, rule: ConflictRule) -> Self {
        Self { outcome, rule }
    }
}

fn from_ordering(local_vs_remote: Ordering) -> Option<ConflictOutcome> {
    match local_vs_remote {
        Ordering::Greater => Some(ConflictOutcome::LocalWins),
        Ordering::Less => Some(ConflictOutcome::CloudWins),
        Ordering::Equal => None,
    }
}

/// Decide between a locally modified record and a remotely modified one.
pub fn resolve(local: &ClipboardRecord, remote: &ClipboardRecord, window_ms: i64) -> ConflictDecision {
    if local.fingerprint == remote.fingerprint {
        return ConflictDecision::new(ConflictOutcome::Merged, ConflictRule::ContentIdentity);
    }

    let delta = (local.last_modified - remote.last_modified).abs();
    if delta < window_ms {
        let hierarchy = local
            .modified_by_role
            .rank()
            .cmp(&remote.modified_by_role.rank());
        if let Some(outcome) = from_ordering(hierarchy) {
            return ConflictDecision::new(outcome, ConflictRule::DeviceHierarchy);
        }
    }

    if let Some(outcome) = from_ordering(local.last_modified.cmp(&remote.last_modified)) {
        return ConflictDecision::new(outcome, ConflictRule::Recency);
    }

    let completeness = local
        .content
        .len()
        .cmp(&remote.content.len())
        .then_with(|| local.fingerprint.bytes.cmp(&remote.fingerprint.bytes));
    if let Some(outcome) = from_ordering(completeness) {
        return ConflictDecision::new(outcome, ConflictRule::Completeness);
    }

    ConflictDecision::new(ConflictOutcome::ConflictUnresolved, ConflictRule::Exhausted)
}
