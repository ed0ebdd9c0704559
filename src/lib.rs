//! RelayClip bootstrap.
//!
//! The only crate that depends on `rc-core`, `rc-app` and `rc-infra` at the
//! same time. It loads configuration, installs tracing, assembles the ports
//! and runs the sync orchestrator.

pub mod bootstrap;
