//! Process runtime: spawn the orchestrator and feed it from stdin.
//!
//! Each stdin line is treated as a clipboard copy on this device. A few
//! slash commands drive the rest of the handle:
//!
//! ```text
//! /edit <id> <text>   /delete <id>   /sync   /online   /offline   /quit
//! ```

use anyhow::{Context, Result};
use rc_app::{OrchestratorSettings, SyncHandle, SyncObservers, SyncOrchestrator};
use rc_core::config::SyncConfig;
use rc_core::{CanonicalId, ClipboardContent};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use super::wiring::{wire_dependencies, WiredApp};
use super::AppPaths;

#[derive(Debug, PartialEq)]
enum InputCommand {
    Copy(String),
    Edit(CanonicalId, String),
    Delete(CanonicalId),
    Sync,
    Online(bool),
    Quit,
}

fn parse_line(line: &str) -> Option<InputCommand> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return None;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Some(InputCommand::Copy(line.to_string()));
    };

    let mut parts = rest.splitn(3, ' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("edit"), Some(id), Some(text)) => {
            Some(InputCommand::Edit(CanonicalId::from(id), text.to_string()))
        }
        (Some("delete"), Some(id), None) => Some(InputCommand::Delete(CanonicalId::from(id))),
        (Some("sync"), None, None) => Some(InputCommand::Sync),
        (Some("online"), None, None) => Some(InputCommand::Online(true)),
        (Some("offline"), None, None) => Some(InputCommand::Online(false)),
        (Some("quit"), None, None) => Some(InputCommand::Quit),
        _ => {
            warn!(input = line, "Unrecognised command");
            None
        }
    }
}

async fn dispatch(handle: &SyncHandle, wired: &WiredApp, command: InputCommand) -> Result<()> {
    match command {
        InputCommand::Copy(text) => {
            let outcome = handle.record_local_copy(ClipboardContent::text(text)).await?;
            info!(?outcome, "Captured");
        }
        InputCommand::Edit(id, text) => handle.edit(id, ClipboardContent::text(text)).await?,
        InputCommand::Delete(id) => handle.delete(id).await?,
        InputCommand::Sync => handle.request_sync().await?,
        InputCommand::Online(online) => wired.connectivity.set_online(online),
        InputCommand::Quit => {}
    }
    Ok(())
}

/// Run until stdin closes, `/quit`, or Ctrl-C.
pub async fn run_app(config: SyncConfig, paths: AppPaths) -> Result<()> {
    let wired = wire_dependencies(&config, &paths).context("Failed to wire dependencies")?;
    let settings = OrchestratorSettings::from_config(&config);

    let (handle, join) = SyncOrchestrator::spawn(wired.deps.clone(), settings, SyncObservers::default())
        .await
        .context("Failed to start sync orchestrator")?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                let Some(command) = parse_line(&line) else {
                    continue;
                };
                if command == InputCommand::Quit {
                    break;
                }
                if let Err(err) = dispatch(&handle, &wired, command).await {
                    warn!(error = %format!("{err:#}"), "Command failed");
                }
            }
        }
    }

    handle.shutdown();
    join.await.context("Sync orchestrator task panicked")?;
    info!("RelayClip stopped");
    Ok(())
}
