//! Plugin construction from config and state backend creation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tableflow_sdk::local::{
    LocalDestinationConfig, LocalFileDestination, LocalFileSource, LocalSourceConfig,
};
use tableflow_state::{SqliteStateBackend, StateBackend};

use crate::config::types::{DestinationConfig, FunctionConfig, SourceConfig, StateBackendKind};

pub(crate) fn build_source(config: &SourceConfig) -> Result<LocalFileSource> {
    let local: LocalSourceConfig = serde_json::from_value(config.config.clone())
        .with_context(|| format!("Invalid config for source plugin '{}'", config.use_ref))?;
    let source = LocalFileSource::new(local)?;
    Ok(source.with_initial_values(config.initial_values.clone()))
}

pub(crate) fn build_destination(config: &DestinationConfig) -> Result<LocalFileDestination> {
    let local: LocalDestinationConfig = serde_json::from_value(config.config.clone())
        .with_context(|| format!("Invalid config for destination plugin '{}'", config.use_ref))?;
    Ok(LocalFileDestination::new(local)?)
}

fn default_state_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".tableflow").join("state.db")
}

pub(crate) fn create_state_backend(config: &FunctionConfig) -> Result<Arc<dyn StateBackend>> {
    match config.state.backend {
        StateBackendKind::Sqlite => {
            let backend = if let Some(path) = &config.state.connection {
                SqliteStateBackend::open(Path::new(path)).context("Failed to open state DB")?
            } else {
                SqliteStateBackend::open(&default_state_path())
                    .context("Failed to open default state DB")?
            };
            Ok(Arc::new(backend) as Arc<dyn StateBackend>)
        }
    }
}
