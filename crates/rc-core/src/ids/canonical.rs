use serde::{Deserialize, Serialize};

use super::id_macro::impl_id;

/// Cross-device identifier of one logical clipboard entry.
///
/// Assigned once by the resolver and never reassigned. When two devices mint
/// an ID for the same item the later one is aliased to the survivor instead.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CanonicalId(String);

/// Identifier of a queued mutation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationId(String);

impl_id!(CanonicalId, OperationId);
