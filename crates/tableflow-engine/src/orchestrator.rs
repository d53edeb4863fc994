//! Config-driven entry points: run a registered function, inspect or reset
//! its checkpoint.

use anyhow::Context;
use tableflow_types::state::{CheckpointRecord, FunctionId};

use crate::config::types::FunctionConfig;
use crate::config::validator::validate_function;
use crate::errors::PipelineError;
use crate::function::identity;
use crate::resolve::{build_destination, build_source, create_state_backend};
use crate::result::RunResult;
use crate::runner::{run_function, RunOptions};

/// Run the function described by `config` once.
///
/// The configured function forwards each parameter to the output of the same
/// position, so the source drives what the destination receives.
///
/// # Errors
///
/// Returns an error if the config is invalid, the state backend cannot be
/// opened, or any stage of the run fails.
pub fn run_configured(config: &FunctionConfig) -> Result<RunResult, PipelineError> {
    validate_function(config)?;
    let state = create_state_backend(config)?;
    let mut source = build_source(&config.source)?;
    let mut destination = build_destination(&config.destination)?;
    let mut function = identity(config.function.as_str(), config.parameters.clone());

    let options = RunOptions {
        working_dir: config.working_dir.clone(),
        use_decorator_values: config.source.use_decorator_values,
    };
    run_function(
        &FunctionId::new(config.function.as_str()),
        &mut source,
        &mut function,
        &mut destination,
        state.as_ref(),
        &options,
    )
}

/// Persisted checkpoint of the function, if any.
///
/// # Errors
///
/// Returns an error if the state backend cannot be opened or read.
pub fn show_checkpoint(config: &FunctionConfig) -> anyhow::Result<Option<CheckpointRecord>> {
    let state = create_state_backend(config)?;
    state
        .get_checkpoint(&FunctionId::new(config.function.as_str()))
        .with_context(|| format!("Failed to read checkpoint for '{}'", config.function))
}

/// Remove the persisted checkpoint so the next run starts from the source's
/// registration-time values. Returns whether a checkpoint existed.
///
/// # Errors
///
/// Returns an error if the state backend cannot be opened or written.
pub fn reset_checkpoint(config: &FunctionConfig) -> anyhow::Result<bool> {
    let state = create_state_backend(config)?;
    let cleared = state
        .clear_checkpoint(&FunctionId::new(config.function.as_str()))
        .with_context(|| format!("Failed to clear checkpoint for '{}'", config.function))?;
    tracing::info!(function = config.function.as_str(), cleared, "Checkpoint reset");
    Ok(cleared)
}
