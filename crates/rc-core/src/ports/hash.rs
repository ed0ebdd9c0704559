use anyhow::Result;

use crate::fingerprint::ContentFingerprint;

pub trait ContentHashPort: Send + Sync {
    fn hash_bytes(&self, bytes: &[u8]) -> Result<ContentFingerprint>;
}
