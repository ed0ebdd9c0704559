use anyhow::Result;
use rc_core::ports::ContentHashPort;
use rc_core::{ContentFingerprint, HashAlgorithm};
use sha2::{Digest, Sha256};

pub struct Sha256Hasher;

impl ContentHashPort for Sha256Hasher {
    fn hash_bytes(&self, bytes: &[u8]) -> Result<ContentFingerprint> {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let out: [u8; 32] = hasher.finalize().into();
        Ok(ContentFingerprint::new(HashAlgorithm::Sha256V1, out))
    }
}
