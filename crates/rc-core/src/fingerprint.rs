//! Content fingerprints: the primary deduplication and correlation key.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::hash::Hash;
use std::str::FromStr;

use crate::ports::ContentHashPort;
use crate::record::ClipboardContent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    Blake3V1,
    Sha256V1,
}

impl HashAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Blake3V1 => "blake3v1",
            HashAlgorithm::Sha256V1 => "sha256v1",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContentFingerprint {
    pub alg: HashAlgorithm,
    pub bytes: [u8; 32],
}

impl ContentFingerprint {
    pub fn new(alg: HashAlgorithm, bytes: [u8; 32]) -> Self {
        Self { alg, bytes }
    }
}

impl Display for ContentFingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.alg.as_str(), hex::encode(self.bytes))
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FingerprintParseError {
    #[error("missing algorithm prefix")]
    MissingPrefix,
    #[error("unknown hash algorithm: {0}")]
    UnknownAlgorithm(String),
    #[error("invalid digest: {0}")]
    InvalidDigest(String),
}

impl FromStr for ContentFingerprint {
    type Err = FingerprintParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (alg, digest) = s
            .split_once(':')
            .ok_or(FingerprintParseError::MissingPrefix)?;
        let alg = match alg {
            "blake3v1" => HashAlgorithm::Blake3V1,
            "sha256v1" => HashAlgorithm::Sha256V1,
            other => return Err(FingerprintParseError::UnknownAlgorithm(other.to_string())),
        };
        let raw = hex::decode(digest)
            .map_err(|e| FingerprintParseError::InvalidDigest(e.to_string()))?;
        let bytes: [u8; 32] = raw
            .try_into()
            .map_err(|_| FingerprintParseError::InvalidDigest("expected 32 bytes".to_string()))?;
        Ok(Self { alg, bytes })
    }
}

/// Deterministic fingerprint of a clipboard payload.
pub fn fingerprint(
    hasher: &dyn ContentHashPort,
    content: &ClipboardContent,
) -> anyhow::Result<ContentFingerprint> {
    hasher.hash_bytes(&content.fingerprint_input())
}
