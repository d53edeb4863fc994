//! Single function run: source, user function, destination, checkpoint.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use tableflow_sdk::checkpoint::CheckpointState;
use tableflow_sdk::context::ExecutionContext;
use tableflow_sdk::destination::{run_destination, DestinationPlugin};
use tableflow_sdk::results::{NamedResult, ResultsCollection};
use tableflow_sdk::source::{run_source, SourcePlugin};
use tableflow_sdk::value::Value;
use tableflow_state::StateBackend;
use tableflow_types::state::{FunctionId, RunStats, RunStatus};

use crate::checkpoint::{commit_checkpoint, seed_checkpoint};
use crate::errors::PipelineError;
use crate::function::UserFunction;
use crate::result::RunResult;

/// Per-run execution options.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Base directory for working directories. Runs get
    /// `<base>/<function>/run-<id>`, which is kept after the run. A
    /// temporary directory, removed after the run, is used when unset.
    pub working_dir: Option<PathBuf>,
    /// Seed the source from its registration-time values on every run.
    pub use_decorator_values: bool,
}

/// Where a run materializes intermediate files.
enum WorkingDir {
    Temporary(tempfile::TempDir),
    Kept(PathBuf),
}

impl WorkingDir {
    fn prepare(base: Option<&Path>, function: &FunctionId, run_id: i64) -> anyhow::Result<Self> {
        match base {
            Some(base) => {
                let path = base.join(function.as_str()).join(format!("run-{run_id}"));
                fs::create_dir_all(&path).with_context(|| {
                    format!("Failed to create working directory {}", path.display())
                })?;
                Ok(Self::Kept(path))
            }
            None => tempfile::Builder::new()
                .prefix("tableflow-")
                .tempdir()
                .map(Self::Temporary)
                .context("Failed to create temporary working directory"),
        }
    }

    fn path(&self) -> &Path {
        match self {
            Self::Temporary(dir) => dir.path(),
            Self::Kept(path) => path,
        }
    }

    /// Create and return the output folder for one plugin stage.
    fn stage(&self, name: &str) -> anyhow::Result<PathBuf> {
        let folder = self.path().join(name);
        fs::create_dir_all(&folder)
            .with_context(|| format!("Failed to create {name} folder {}", folder.display()))?;
        Ok(folder)
    }
}

/// Frame and row counts over positional values.
fn count_frames(values: &[Value]) -> (u64, u64) {
    values
        .iter()
        .flat_map(Value::frames)
        .fold((0, 0), |(frames, rows), frame| {
            (frames + 1, rows + frame.num_rows() as u64)
        })
}

struct Run<'a> {
    function_id: &'a FunctionId,
    run_id: i64,
    state_backend: &'a dyn StateBackend,
    options: &'a RunOptions,
    span: tracing::Span,
}

impl Run<'_> {
    fn execute<S, F, D>(
        &self,
        source: &mut S,
        function: &mut F,
        destination: &mut D,
        stats: &mut RunStats,
    ) -> Result<RunResult, PipelineError>
    where
        S: SourcePlugin,
        F: UserFunction,
        D: DestinationPlugin,
    {
        let start = Instant::now();
        let work = WorkingDir::prepare(
            self.options.working_dir.as_deref(),
            self.function_id,
            self.run_id,
        )?;
        tracing::debug!(working_dir = %work.path().display(), "Prepared working directory");

        // 1. Source
        let seed = seed_checkpoint(
            self.state_backend,
            self.function_id,
            self.options.use_decorator_values,
        )?;
        let mut source_ctx =
            ExecutionContext::new(work.stage("source")?, seed).with_logger(self.span.clone());
        let source_start = Instant::now();
        let inputs = run_source(source, &mut source_ctx)
            .map_err(|e| PipelineError::source_plugin(S::IDENTIFIER, e))?;
        let source_duration_secs = source_start.elapsed().as_secs_f64();
        (stats.frames_read, stats.rows_read) = count_frames(&inputs);

        if inputs.len() != function.parameters().len() {
            return Err(PipelineError::ParameterMismatch {
                function: function.name().to_string(),
                expected: function.parameters().len(),
                actual: inputs.len(),
            });
        }

        // 2. User function
        let function_start = Instant::now();
        let outputs = function
            .call(inputs)
            .map_err(|source| PipelineError::Function {
                function: function.name().to_string(),
                source,
            })?;
        let function_duration_secs = function_start.elapsed().as_secs_f64();
        if outputs.len() != function.outputs().len() {
            return Err(PipelineError::OutputMismatch {
                function: function.name().to_string(),
                expected: function.outputs().len(),
                actual: outputs.len(),
            });
        }
        let results: ResultsCollection = function
            .outputs()
            .iter()
            .zip(outputs)
            .map(|(name, value)| NamedResult::new(name.as_str(), value))
            .collect();
        stats.results_written = results.iter().filter(|r| !r.value.is_null()).count() as u64;

        // 3. Destination
        let dest_ctx = ExecutionContext::new(work.stage("destination")?, CheckpointState::default())
            .with_logger(self.span.clone());
        let dest_start = Instant::now();
        run_destination(destination, &dest_ctx, results)
            .map_err(|e| PipelineError::destination_plugin(D::IDENTIFIER, e))?;
        let dest_duration_secs = dest_start.elapsed().as_secs_f64();

        // 4. Checkpoint, only once the destination has confirmed delivery
        let checkpoint_state = source_ctx.into_status().into_offset();
        stats.checkpoint_committed = commit_checkpoint(
            self.state_backend,
            self.function_id,
            &checkpoint_state,
            Some(self.run_id),
        )?;

        Ok(RunResult {
            run_id: self.run_id,
            parameters: function.parameters().len(),
            frames_read: stats.frames_read,
            rows_read: stats.rows_read,
            results_written: stats.results_written,
            checkpoint: checkpoint_state.into_committed(),
            source_duration_secs,
            function_duration_secs,
            dest_duration_secs,
            duration_secs: start.elapsed().as_secs_f64(),
        })
    }
}

/// Run `function` once between `source` and `destination`.
///
/// The run is recorded in `state_backend`; its checkpoint advances only
/// when every stage succeeded and the source published new values.
///
/// # Errors
///
/// Returns the first failure of any stage. The run is recorded as failed
/// and the checkpoint is left unchanged.
pub fn run_function<S, F, D>(
    function_id: &FunctionId,
    source: &mut S,
    function: &mut F,
    destination: &mut D,
    state_backend: &dyn StateBackend,
    options: &RunOptions,
) -> Result<RunResult, PipelineError>
where
    S: SourcePlugin,
    F: UserFunction,
    D: DestinationPlugin,
{
    let run_id = state_backend.start_run(function_id)?;
    let span = tracing::info_span!("plugin_run", function = function_id.as_str(), run_id);
    let run = Run {
        function_id,
        run_id,
        state_backend,
        options,
        span: span.clone(),
    };

    tracing::info!(
        function = function_id.as_str(),
        run_id,
        source = S::IDENTIFIER,
        destination = D::IDENTIFIER,
        "Starting function run"
    );
    let mut stats = RunStats::default();
    let outcome = span.in_scope(|| run.execute(source, function, destination, &mut stats));

    match outcome {
        Ok(result) => {
            state_backend.complete_run(run_id, RunStatus::Completed, &stats)?;
            tracing::info!(
                function = function_id.as_str(),
                run_id,
                frames_read = result.frames_read,
                rows_read = result.rows_read,
                results_written = result.results_written,
                checkpoint_committed = result.checkpoint_committed(),
                duration_secs = result.duration_secs,
                "Function run completed"
            );
            Ok(result)
        }
        Err(err) => {
            stats.error_message = Some(err.to_string());
            if let Err(record_err) = state_backend.complete_run(run_id, RunStatus::Failed, &stats) {
                tracing::warn!(run_id, error = %record_err, "Failed to record failed run");
            }
            tracing::error!(function = function_id.as_str(), run_id, error = %err, "Function run failed");
            Err(err)
        }
    }
}
