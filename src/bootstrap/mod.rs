pub mod app_paths;
pub mod config;
pub mod run;
pub mod tracing;
pub mod wiring;

pub use app_paths::AppPaths;
pub use config::{load_config, load_config_or_default};
pub use run::run_app;
pub use wiring::{wire_dependencies, WiringError, WiringResult};
