use std::path::PathBuf;

use anyhow::Context;
use relayclip::bootstrap::config::default_config_path;
use relayclip::bootstrap::tracing::init_tracing_subscriber;
use relayclip::bootstrap::{load_config_or_default, run_app, AppPaths};
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    // Optional first argument overrides the config path
    let config_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);

    let config = load_config_or_default(&config_path)?;
    let paths = AppPaths::from_config(&config);

    init_tracing_subscriber(&paths.logs_dir).context("Failed to initialize tracing")?;
    info!(
        config = %config_path.display(),
        data_dir = %paths.data_dir.display(),
        "Starting RelayClip"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("relayclip")
        .build()
        .context("Failed to create tokio runtime")?;

    let result = runtime.block_on(run_app(config, paths));
    if let Err(err) = &result {
        error!(error = %format!("{err:#}"), "RelayClip exited with error");
    }
    result
}
