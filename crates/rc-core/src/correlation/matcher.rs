use super::similarity::{edit_distance, normalize_whitespace};
use super::CorrelationCandidate;
use crate::ids::CanonicalId;
use crate::record::ClipboardRecord;

/// Window for matching a handoff payload against records seen elsewhere.
pub const HANDOFF_WINDOW_MS: i64 = 15_000;

/// Window for recognising the echo of a copy this device just wrote itself.
pub const LOCAL_ECHO_WINDOW_MS: i64 = 2_000;

/// Maximum normalised edit distance, as a fraction of the longer text.
pub const SIMILARITY_RATIO: f64 = 0.10;

/// Texts above this size only match after whitespace normalisation.
const MAX_SIMILARITY_CHARS: usize = 4_096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    /// Same fingerprint inside the window.
    Exact { canonical_id: CanonicalId },
    /// Near-duplicate text inside the window.
    Similar {
        canonical_id: CanonicalId,
        distance: usize,
    },
    NoMatch,
}

impl MatchResult {
    pub fn canonical_id(&self) -> Option<&CanonicalId> {
        match self {
            MatchResult::Exact { canonical_id } | MatchResult::Similar { canonical_id, .. } => {
                Some(canonical_id)
            }
            MatchResult::NoMatch => None,
        }
    }

    pub fn is_match(&self) -> bool {
        !matches!(self, MatchResult::NoMatch)
    }
}

/// Match a candidate against the records observed within `window_ms`.
///
/// Both the temporal and the content condition must hold. Exact fingerprint
/// matches beat similarity matches; among equals the record closest in time
/// wins, then the earliest created.
pub fn correlate(
    candidate: &CorrelationCandidate,
    window_records: &[ClipboardRecord],
    window_ms: i64,
) -> MatchResult {
    let in_window = window_records.iter().filter(|record| {
        record.is_live() && (candidate.received_at - record.last_modified).abs() <= window_ms
    });

    let mut best_exact: Option<&ClipboardRecord> = None;
    let mut best_similar: Option<(&ClipboardRecord, usize)> = None;

    for record in in_window {
        if record.fingerprint == candidate.fingerprint {
            if closer(candidate, record, best_exact) {
                best_exact = Some(record);
            }
            continue;
        }
        if best_exact.is_some() {
            continue;
        }
        if let Some(distance) = similar_distance(candidate, record) {
            let better = match best_similar {
                None => true,
                Some((current, current_distance)) => {
                    distance < current_distance
                        || (distance == current_distance && closer(candidate, record, Some(current)))
                }
            };
            if better {
                best_similar = Some((record, distance));
            }
        }
    }

    if let Some(record) = best_exact {
        return MatchResult::Exact {
            canonical_id: record.canonical_id.clone(),
        };
    }
    match best_similar {
        Some((record, distance)) => MatchResult::Similar {
            canonical_id: record.canonical_id.clone(),
            distance,
        },
        None => MatchResult::NoMatch,
    }
}

fn closer(
    candidate: &CorrelationCandidate,
    record: &ClipboardRecord,
    current: Option<&ClipboardRecord>,
) -> bool {
    let Some(current) = current else {
        return true;
    };
    let gap = (candidate.received_at - record.last_modified).abs();
    let current_gap = (candidate.received_at - current.last_modified).abs();
    gap < current_gap || (gap == current_gap && record.created_at < current.created_at)
}

fn similar_distance(candidate: &CorrelationCandidate, record: &ClipboardRecord) -> Option<usize> {
    if candidate.content.content_type() != record.content_type() {
        return None;
    }
    let a = normalize_whitespace(candidate.content.as_text()?);
    let b = normalize_whitespace(record.content.as_text()?);
    if a == b {
        return Some(0);
    }

    let longest = a.chars().count().max(b.chars().count());
    if longest > MAX_SIMILARITY_CHARS {
        return None;
    }
    let threshold = (longest as f64 * SIMILARITY_RATIO).floor() as usize;
    let length_gap = a.chars().count().abs_diff(b.chars().count());
    if threshold == 0 || length_gap > threshold {
        return None;
    }

    let distance = edit_distance(&a, &b);
    (distance <= threshold).then_some(distance)
}
