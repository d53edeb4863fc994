//! Function registration config types.

use std::path::PathBuf;

use serde::Deserialize;
use tableflow_types::checkpoint::InitialValues;

/// Top-level function registration parsed from YAML.
#[derive(Debug, Clone, Deserialize)]
pub struct FunctionConfig {
    pub version: String,
    pub function: String,
    /// Declared parameter names, in positional order.
    #[serde(default)]
    pub parameters: Vec<String>,
    pub source: SourceConfig,
    pub destination: DestinationConfig,
    #[serde(default)]
    pub state: StateConfig,
    /// Base directory for per-run working directories. A temporary
    /// directory is used when unset.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(rename = "use")]
    pub use_ref: String,
    #[serde(default)]
    pub config: serde_json::Value,
    /// Registration-time checkpoint values.
    #[serde(default)]
    pub initial_values: InitialValues,
    /// Seed every run from `initial_values`, ignoring persisted checkpoints.
    #[serde(default)]
    pub use_decorator_values: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DestinationConfig {
    #[serde(rename = "use")]
    pub use_ref: String,
    #[serde(default)]
    pub config: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateBackendKind {
    #[default]
    Sqlite,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StateConfig {
    #[serde(default)]
    pub backend: StateBackendKind,
    /// Database path. Defaults to `~/.tableflow/state.db`.
    pub connection: Option<String>,
}
