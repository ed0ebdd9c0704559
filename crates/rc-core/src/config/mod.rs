//! Configuration DTOs.
//!
//! `SyncConfig` is plain data mapped from TOML. Missing keys take the
//! documented defaults; only values that cannot be interpreted at all
//! (an unknown role or hash algorithm) are rejected.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};

use crate::device::DeviceRole;
use crate::fingerprint::HashAlgorithm;
use crate::retry::RetryPolicy;

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_CONFLICT_WINDOW_SECS: u64 = 10;
pub const DEFAULT_HANDOFF_WINDOW_SECS: u64 = 15;
pub const DEFAULT_LOCAL_ECHO_WINDOW_SECS: u64 = 2;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1_000;
pub const DEFAULT_RETRY_MAX_DELAY_SECS: u64 = 300;

#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// `None` when the file does not say; the bootstrap decides.
    pub role: Option<DeviceRole>,
    pub data_dir: PathBuf,
    pub poll_interval_secs: u64,
    pub conflict_window_secs: u64,
    pub handoff_window_secs: u64,
    pub local_echo_window_secs: u64,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_secs: u64,
    pub database_path: PathBuf,
    pub hash_algorithm: HashAlgorithm,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            role: None,
            data_dir: PathBuf::new(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            conflict_window_secs: DEFAULT_CONFLICT_WINDOW_SECS,
            handoff_window_secs: DEFAULT_HANDOFF_WINDOW_SECS,
            local_echo_window_secs: DEFAULT_LOCAL_ECHO_WINDOW_SECS,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            retry_max_delay_secs: DEFAULT_RETRY_MAX_DELAY_SECS,
            database_path: PathBuf::new(),
            hash_algorithm: HashAlgorithm::Blake3V1,
        }
    }
}

fn get<'a>(value: &'a toml::Value, section: &str, key: &str) -> Option<&'a toml::Value> {
    value.get(section).and_then(|s| s.get(key))
}

fn get_u64(value: &toml::Value, section: &str, key: &str, default: u64) -> u64 {
    get(value, section, key)
        .and_then(|v| v.as_integer())
        .filter(|v| *v >= 0)
        .map(|v| v as u64)
        .unwrap_or(default)
}

fn get_path(value: &toml::Value, section: &str, key: &str) -> PathBuf {
    PathBuf::from(get(value, section, key).and_then(|v| v.as_str()).unwrap_or(""))
}

impl SyncConfig {
    pub fn from_toml(toml_value: &toml::Value) -> Result<Self> {
        let role = match get(toml_value, "device", "role").and_then(|v| v.as_str()) {
            Some(raw) => Some(
                raw.parse::<DeviceRole>()
                    .map_err(|e| anyhow!("invalid [device] role: {e}"))?,
            ),
            None => None,
        };

        let hash_algorithm = match get(toml_value, "fingerprint", "algorithm").and_then(|v| v.as_str()) {
            None => HashAlgorithm::Blake3V1,
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "blake3" | "blake3v1" => HashAlgorithm::Blake3V1,
                "sha256" | "sha256v1" => HashAlgorithm::Sha256V1,
                other => return Err(anyhow!("invalid [fingerprint] algorithm: {other}")),
            },
        };

        Ok(Self {
            role,
            data_dir: get_path(toml_value, "device", "data_dir"),
            poll_interval_secs: get_u64(toml_value, "sync", "poll_interval_secs", DEFAULT_POLL_INTERVAL_SECS),
            conflict_window_secs: get_u64(
                toml_value,
                "sync",
                "conflict_window_secs",
                DEFAULT_CONFLICT_WINDOW_SECS,
            ),
            handoff_window_secs: get_u64(toml_value, "sync", "handoff_window_secs", DEFAULT_HANDOFF_WINDOW_SECS),
            local_echo_window_secs: get_u64(
                toml_value,
                "sync",
                "local_echo_window_secs",
                DEFAULT_LOCAL_ECHO_WINDOW_SECS,
            ),
            retry_base_delay_ms: get_u64(toml_value, "retry", "base_delay_ms", DEFAULT_RETRY_BASE_DELAY_MS),
            retry_max_delay_secs: get_u64(toml_value, "retry", "max_delay_secs", DEFAULT_RETRY_MAX_DELAY_SECS),
            database_path: get_path(toml_value, "storage", "database_path"),
            hash_algorithm,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            Duration::from_millis(self.retry_base_delay_ms),
            Duration::from_secs(self.retry_max_delay_secs),
        )
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn conflict_window_ms(&self) -> i64 {
        secs_to_ms(self.conflict_window_secs)
    }

    pub fn handoff_window_ms(&self) -> i64 {
        secs_to_ms(self.handoff_window_secs)
    }

    pub fn local_echo_window_ms(&self) -> i64 {
        secs_to_ms(self.local_echo_window_secs)
    }
}

fn secs_to_ms(secs: u64) -> i64 {
    i64::try_from(secs.saturating_mul(1000)).unwrap_or(i64::MAX)
}
