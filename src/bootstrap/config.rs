//! # Configuration Loader
//!
//! Reads the TOML file and maps it into [`SyncConfig`]. Defaults for missing
//! keys live in `SyncConfig::from_toml`; path resolution lives in
//! [`AppPaths`](super::AppPaths). This module only loads.

use std::path::{Path, PathBuf};

use anyhow::Context;
use rc_core::config::SyncConfig;

pub const CONFIG_ENV_VAR: &str = "RELAYCLIP_CONFIG";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Load configuration from a TOML file.
///
/// # Errors
///
/// Returns error if the file cannot be read, is not valid TOML, or names an
/// unknown device role or hash algorithm.
pub fn load_config(config_path: PathBuf) -> anyhow::Result<SyncConfig> {
    let content = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let toml_value: toml::Value =
        toml::from_str(&content).context("Failed to parse config as TOML")?;
    SyncConfig::from_toml(&toml_value)
        .with_context(|| format!("Invalid config file: {}", config_path.display()))
}

/// Like [`load_config`], but a missing file yields the built-in defaults.
///
/// A file that exists and fails to parse is still an error. Runs before the
/// tracing subscriber is installed, so it does not log.
pub fn load_config_or_default(config_path: &Path) -> anyhow::Result<SyncConfig> {
    if !config_path.exists() {
        return Ok(SyncConfig::default());
    }
    load_config(config_path.to_path_buf())
}

/// `$RELAYCLIP_CONFIG`, else `<config dir>/relayclip/config.toml`.
pub fn default_config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(super::app_paths::APP_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}
