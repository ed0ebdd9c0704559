//! Filesystem layout of an installation.

use std::path::{Path, PathBuf};

use rc_core::config::SyncConfig;

pub const APP_DIR_NAME: &str = "relayclip";
const DATABASE_FILE_NAME: &str = "relayclip.db";
const LOGS_DIR_NAME: &str = "logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
    pub logs_dir: PathBuf,
}

impl AppPaths {
    /// Paths under the platform's local data directory.
    pub fn platform_default() -> Self {
        Self::under(&default_data_dir())
    }

    /// Standard layout rooted at `data_dir`.
    pub fn under(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            database_path: data_dir.join(DATABASE_FILE_NAME),
            logs_dir: data_dir.join(LOGS_DIR_NAME),
        }
    }

    /// Empty paths in the config mean "use the standard layout".
    pub fn from_config(config: &SyncConfig) -> Self {
        let mut paths = if config.data_dir.as_os_str().is_empty() {
            Self::platform_default()
        } else {
            Self::under(&config.data_dir)
        };
        if !config.database_path.as_os_str().is_empty() {
            paths.database_path = config.database_path.clone();
        }
        paths
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_data_dir_roots_every_path() {
        let config = SyncConfig {
            data_dir: PathBuf::from("/srv/rc"),
            ..SyncConfig::default()
        };

        let paths = AppPaths::from_config(&config);

        assert_eq!(paths.data_dir, PathBuf::from("/srv/rc"));
        assert_eq!(paths.database_path, PathBuf::from("/srv/rc/relayclip.db"));
        assert_eq!(paths.logs_dir, PathBuf::from("/srv/rc/logs"));
    }

    #[test]
    fn explicit_database_path_wins() {
        let config = SyncConfig {
            data_dir: PathBuf::from("/srv/rc"),
            database_path: PathBuf::from("/mnt/fast/clips.db"),
            ..SyncConfig::default()
        };

        let paths = AppPaths::from_config(&config);

        assert_eq!(paths.database_path, PathBuf::from("/mnt/fast/clips.db"));
        assert_eq!(paths.logs_dir, PathBuf::from("/srv/rc/logs"));
    }

    #[test]
    fn empty_config_uses_platform_layout() {
        let paths = AppPaths::from_config(&SyncConfig::default());
        assert!(paths.data_dir.ends_with(APP_DIR_NAME));
        assert_eq!(paths, AppPaths::platform_default());
    }
}
