//! State backend model types.
//!
//! Pure data types used by `StateBackend` implementations. Kept in the types
//! crate so the engine and state crates can share them without circular
//! dependencies.

use serde::{Deserialize, Serialize};

use crate::checkpoint::InitialValues;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Opaque identifier of a registered function.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionId(String);

impl FunctionId {
    /// Create a new function identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FunctionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<S: Into<String>> From<S> for FunctionId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

// ---------------------------------------------------------------------------
// Run tracking
// ---------------------------------------------------------------------------

/// Terminal status of a function run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    /// Wire-format string for storage.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate statistics for a finished function run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Frames produced by the source plugin (list members counted individually).
    pub frames_read: u64,
    /// Rows across all frames produced by the source plugin.
    pub rows_read: u64,
    /// Non-null results handed to the destination plugin.
    pub results_written: u64,
    /// Whether this run committed a new checkpoint.
    pub checkpoint_committed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

// ---------------------------------------------------------------------------
// Checkpoint state
// ---------------------------------------------------------------------------

/// Snapshot of the persisted checkpoint for a function.
///
/// `updated_at` is an ISO-8601 UTC string (e.g. `"2026-01-15T10:00:00Z"`).
/// Backends handle timestamp formatting internally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    /// Values published by the source plugin in the committing run.
    pub values: InitialValues,
    /// Run that committed these values, if it was tracked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<i64>,
    /// ISO-8601 UTC timestamp of when this checkpoint was last written.
    pub updated_at: String,
}
