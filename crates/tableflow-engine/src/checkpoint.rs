//! Checkpoint seeding and commit against the state backend.

use tableflow_sdk::checkpoint::CheckpointState;
use tableflow_state::{StateBackend, StateError};
use tableflow_types::state::FunctionId;

/// Build the checkpoint state a source run starts from.
///
/// With `use_decorator_values` the persisted checkpoint is not consulted and
/// the plugin's registration-time values seed every run.
///
/// # Errors
///
/// Propagates state backend failures, including corrupt checkpoints.
pub fn seed_checkpoint(
    state_backend: &dyn StateBackend,
    function: &FunctionId,
    use_decorator_values: bool,
) -> Result<CheckpointState, StateError> {
    if use_decorator_values {
        tracing::debug!(
            function = function.as_str(),
            "Seeding from registration-time values"
        );
        return Ok(CheckpointState::decorator_values());
    }

    let record = state_backend.get_checkpoint(function)?;
    match &record {
        Some(record) => tracing::info!(
            function = function.as_str(),
            values = %record.values,
            updated_at = %record.updated_at,
            "Resuming from checkpoint"
        ),
        None => tracing::info!(function = function.as_str(), "No prior checkpoint"),
    }
    Ok(CheckpointState::resume(record.map(|r| r.values)))
}

/// Persist the values a source run committed, if any. Returns whether the
/// checkpoint advanced.
///
/// Call only after the destination has succeeded; a failed run never
/// advances the checkpoint.
///
/// # Errors
///
/// Propagates state backend failures.
pub fn commit_checkpoint(
    state_backend: &dyn StateBackend,
    function: &FunctionId,
    state: &CheckpointState,
    run_id: Option<i64>,
) -> Result<bool, StateError> {
    let Some(values) = state.committed() else {
        tracing::debug!(
            function = function.as_str(),
            "Source returned no new values, checkpoint unchanged"
        );
        return Ok(false);
    };
    state_backend.set_checkpoint(function, values, run_id)?;
    tracing::info!(
        function = function.as_str(),
        values = %values,
        "Checkpoint advanced"
    );
    Ok(true)
}
