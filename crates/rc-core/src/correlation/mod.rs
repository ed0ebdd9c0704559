//! Fingerprint correlation across devices.
//!
//! Everything here is a pure computation over already-loaded records.

mod candidate;
mod matcher;
mod similarity;

pub use candidate::{CorrelationCandidate, HandoffPayload, SourceHint};
pub use matcher::{
    correlate, MatchResult, HANDOFF_WINDOW_MS, LOCAL_ECHO_WINDOW_MS, SIMILARITY_RATIO,
};
pub use similarity::{edit_distance, normalize_whitespace};
