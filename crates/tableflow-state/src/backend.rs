//! State backend trait definition.
//!
//! [`StateBackend`] defines the storage contract for function checkpoints
//! and run history. Model types live in [`tableflow_types::state`].

use tableflow_types::checkpoint::InitialValues;
use tableflow_types::state::{CheckpointRecord, FunctionId, RunStats, RunStatus};

use crate::error;

/// Storage contract for function state.
///
/// Implementations must be `Send + Sync` for use behind `Arc<dyn StateBackend>`.
pub trait StateBackend: Send + Sync {
    /// Read the current checkpoint for a function.
    ///
    /// Returns `Ok(None)` when no checkpoint has been persisted yet.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`](crate::error::StateError) on storage failure
    /// or if the stored mapping cannot be decoded.
    fn get_checkpoint(&self, function: &FunctionId) -> error::Result<Option<CheckpointRecord>>;

    /// Replace the checkpoint for a function.
    ///
    /// The stored mapping is overwritten as a whole; values are never merged.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`](crate::error::StateError) on storage failure.
    fn set_checkpoint(
        &self,
        function: &FunctionId,
        values: &InitialValues,
        run_id: Option<i64>,
    ) -> error::Result<()>;

    /// Delete the checkpoint for a function. Returns `true` if one existed.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`](crate::error::StateError) on storage failure.
    fn clear_checkpoint(&self, function: &FunctionId) -> error::Result<bool>;

    /// Begin a new function run, returning its unique ID.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`](crate::error::StateError) on storage failure.
    fn start_run(&self, function: &FunctionId) -> error::Result<i64>;

    /// Finalize a run with status and aggregate stats.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`](crate::error::StateError) on storage failure.
    fn complete_run(&self, run_id: i64, status: RunStatus, stats: &RunStats)
        -> error::Result<()>;
}
