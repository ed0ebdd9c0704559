use anyhow::Result;
use rc_core::ports::ContentHashPort;
use rc_core::{ContentFingerprint, HashAlgorithm};

pub struct Blake3Hasher;

impl ContentHashPort for Blake3Hasher {
    fn hash_bytes(&self, bytes: &[u8]) -> Result<ContentFingerprint> {
        let hash = blake3::hash(bytes);
        Ok(ContentFingerprint::new(HashAlgorithm::Blake3V1, hash.into()))
    }
}
