//! Canonical-ID tie-break and aliasing.
//!
//! The shared store offers no locking, so two devices can mint IDs for the
//! same logical item. The earliest `created_at` survives; the other ID becomes
//! an alias that dependent metadata follows to the survivor.

use serde::{Deserialize, Serialize};

use crate::ids::CanonicalId;
use crate::record::ClipboardRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalAlias {
    pub alias_id: CanonicalId,
    pub surviving_id: CanonicalId,
    pub created_at: i64,
}

/// Outcome of comparing two records that turned out to be one logical item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurvivorChoice<'a> {
    pub survivor: &'a ClipboardRecord,
    pub loser: &'a ClipboardRecord,
}

/// Earliest `created_at` wins; equal timestamps fall back to the smaller ID.
pub fn pick_survivor<'a>(a: &'a ClipboardRecord, b: &'a ClipboardRecord) -> SurvivorChoice<'a> {
    let a_first = (a.created_at, &a.canonical_id) <= (b.created_at, &b.canonical_id);
    if a_first {
        SurvivorChoice {
            survivor: a,
            loser: b,
        }
    } else {
        SurvivorChoice {
            survivor: b,
            loser: a,
        }
    }
}
