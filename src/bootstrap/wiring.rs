//! # Dependency Injection
//!
//! Creates the infra implementations and groups them into [`SyncDeps`].
//!
//! Assembly only: no sync decisions are made here, and nothing calls a
//! concrete adapter after the deps are built.

use std::path::Path;
use std::sync::Arc;

use rc_app::SyncDeps;
use rc_core::config::SyncConfig;
use rc_core::ports::*;
use rc_core::DeviceRole;
use rc_infra::db::mappers::{
    CanonicalAliasRowMapper, ClipboardRecordRowMapper, PendingOperationRowMapper,
};
use rc_infra::db::repositories::{
    DieselCanonicalAliasRepository, DieselClipboardRecordRepository,
    DieselPendingOperationRepository,
};
use rc_infra::db::{init_db_pool, DbPool, DieselSqliteExecutor};
use rc_infra::{hasher_for, InMemorySharedStore, LocalDeviceIdentity, SystemClock, WatchConnectivity};
use tracing::info;

use super::AppPaths;

/// Result type for wiring operations
pub type WiringResult<T> = Result<T, WiringError>;

/// Errors during dependency injection
#[derive(Debug, thiserror::Error)]
pub enum WiringError {
    #[error("Data directory initialization failed: {0}")]
    DataDirInit(String),

    #[error("Database initialization failed: {0}")]
    DatabaseInit(String),

    #[error("Device identity initialization failed: {0}")]
    IdentityInit(String),
}

/// Ports plus the adapters the runtime still drives from outside.
pub struct WiredApp {
    pub deps: SyncDeps,
    pub connectivity: Arc<WatchConnectivity>,
}

fn create_db_pool(db_path: &Path) -> WiringResult<DbPool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            WiringError::DatabaseInit(format!("Failed to create DB directory: {}", e))
        })?;
    }

    let db_url = db_path
        .to_str()
        .ok_or_else(|| WiringError::DatabaseInit("Invalid database path".to_string()))?;

    init_db_pool(db_url)
        .map_err(|e| WiringError::DatabaseInit(format!("Failed to initialize DB: {:#}", e)))
}

/// A config without a role is a client: only the relay must opt in.
pub fn resolve_role(config: &SyncConfig) -> DeviceRole {
    config.role.unwrap_or(DeviceRole::Client)
}

/// Build every port from the config and resolved paths.
///
/// The shared store is the in-process [`InMemorySharedStore`]; the
/// connectivity source starts online.
pub fn wire_dependencies(config: &SyncConfig, paths: &AppPaths) -> WiringResult<WiredApp> {
    std::fs::create_dir_all(&paths.data_dir).map_err(|e| {
        WiringError::DataDirInit(format!("{}: {}", paths.data_dir.display(), e))
    })?;

    let role = resolve_role(config);
    let identity = LocalDeviceIdentity::load_or_create(&paths.data_dir, role)
        .map_err(|e| WiringError::IdentityInit(format!("{:#}", e)))?;

    let pool = create_db_pool(&paths.database_path)?;
    let executor = DieselSqliteExecutor::new(pool);

    let records: Arc<dyn LocalRecordStorePort> = Arc::new(DieselClipboardRecordRepository::new(
        executor.clone(),
        ClipboardRecordRowMapper,
    ));
    let operations: Arc<dyn PendingOperationStorePort> = Arc::new(
        DieselPendingOperationRepository::new(executor.clone(), PendingOperationRowMapper),
    );
    let aliases: Arc<dyn CanonicalAliasPort> = Arc::new(DieselCanonicalAliasRepository::new(
        executor,
        CanonicalAliasRowMapper,
    ));

    let clock: Arc<dyn ClockPort> = Arc::new(SystemClock);
    let shared: Arc<dyn SharedStorePort> = Arc::new(InMemorySharedStore::new(clock.clone()));
    let connectivity = Arc::new(WatchConnectivity::new(true));

    info!(
        device_id = %identity.current_device_id(),
        role = %role,
        database = %paths.database_path.display(),
        hash = ?config.hash_algorithm,
        "Dependencies wired"
    );

    let deps = SyncDeps {
        records,
        operations,
        aliases,
        shared,
        connectivity: connectivity.clone(),
        identity: Arc::new(identity),
        clock,
        hash: hasher_for(config.hash_algorithm),
    };

    Ok(WiredApp { deps, connectivity })
}
