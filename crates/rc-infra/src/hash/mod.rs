mod blake_hasher;
mod sha256_hasher;

use std::sync::Arc;

use rc_core::ports::ContentHashPort;
use rc_core::HashAlgorithm;

pub use blake_hasher::Blake3Hasher;
pub use sha256_hasher::Sha256Hasher;

pub fn hasher_for(alg: HashAlgorithm) -> Arc<dyn ContentHashPort> {
    match alg {
        HashAlgorithm::Blake3V1 => Arc::new(Blake3Hasher),
        HashAlgorithm::Sha256V1 => Arc::new(Sha256Hasher),
    }
}
