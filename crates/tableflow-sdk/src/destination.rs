//! Destination plugins: persist a user function's results.
//!
//! Like sources, a destination implements either [`DestinationPlugin::chunk`]
//! (materialize results as local files, then [`DestinationPlugin::write`]
//! delivers them) or a custom [`DestinationPlugin::stream`].

use std::path::{Path, PathBuf};

use crate::context::ExecutionContext;
use crate::errors::PluginError;
use crate::plugin::{passes_context, PluginKind, StreamMode};
use crate::results::{NamedResult, ResultsCollection};
use crate::value::{frame_shape_error, validate_chunk_output, Param, Value, NESTED_LIST};

/// Egress plugin.
pub trait DestinationPlugin {
    /// Stable identifier of this plugin kind.
    const IDENTIFIER: &'static str;

    /// [`StreamMode::Custom`] when [`DestinationPlugin::stream`] is overridden.
    const STREAM_MODE: StreamMode = StreamMode::Default;

    /// A custom `stream` receives the execution context only when this is set.
    const STREAM_REQUIRES_CONTEXT: bool = false;

    /// Configured targets, one per expected result. `None` accepts any
    /// number of results.
    fn targets(&self) -> Option<&[String]> {
        None
    }

    /// Materialize each result as local files under `working_dir`.
    ///
    /// `results` holds one entry per function output, in order. The return
    /// value follows the same path grammar as a source `chunk`.
    ///
    /// # Errors
    ///
    /// The default implementation fails with [`PluginError::NotImplemented`].
    fn chunk(&mut self, working_dir: &Path, results: &[Value]) -> Result<Value, PluginError> {
        let _ = (working_dir, results);
        Err(PluginError::not_implemented::<Self>("chunk"))
    }

    /// Deliver the files produced by `chunk`. Paths are already resolved
    /// against the working directory.
    ///
    /// # Errors
    ///
    /// Propagates delivery failures. The default does nothing.
    fn write(&mut self, files: Vec<Param<PathBuf>>) -> Result<(), PluginError> {
        let _ = files;
        Ok(())
    }

    /// Persist the results directly.
    ///
    /// # Errors
    ///
    /// The default implementation fails with [`PluginError::NotImplemented`].
    fn stream(
        &mut self,
        working_dir: &Path,
        results: Vec<Value>,
        context: Option<&ExecutionContext>,
    ) -> Result<(), PluginError> {
        let _ = (working_dir, results, context);
        Err(PluginError::not_implemented::<Self>("stream"))
    }
}

/// Stream built on `chunk` and `write`.
///
/// # Errors
///
/// Propagates `chunk` and `write` failures, and [`PluginError::TypeShape`]
/// when `chunk` returns something other than paths and nulls.
pub fn default_stream<P: DestinationPlugin + ?Sized>(
    plugin: &mut P,
    context: &ExecutionContext,
    results: &[Value],
) -> Result<(), PluginError> {
    let working_dir = context.paths().output_folder();
    let files = validate_chunk_output(plugin.chunk(working_dir, results)?)?
        .into_iter()
        .map(|param| param.try_map(|path| Ok::<_, PluginError>(working_dir.join(path))))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(
        plugin = P::IDENTIFIER,
        files = files.iter().map(|p| p.iter().count()).sum::<usize>(),
        "Materialized results"
    );
    plugin.write(files)
}

/// Strip system columns from every frame and check each result's shape.
///
/// # Errors
///
/// Fails with [`PluginError::TypeShape`] naming the first result that is
/// not a frame, null, or flat list of those.
pub fn prepare_results(results: ResultsCollection) -> Result<Vec<Value>, PluginError> {
    results
        .into_iter()
        .map(|NamedResult { name, value }| {
            let structure = value.to_string();
            match value {
                Value::List(items) => items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| match item {
                        Value::List(_) => Err(frame_shape_error(
                            format!("result `{name}`[{i}]"),
                            NESTED_LIST,
                            &structure,
                        )),
                        leaf => strip_leaf(leaf, || format!("result `{name}`[{i}]"), &structure),
                    })
                    .collect::<Result<Vec<_>, PluginError>>()
                    .map(Value::List),
                leaf => strip_leaf(leaf, || format!("result `{name}`"), &structure),
            }
        })
        .collect()
}

fn strip_leaf(
    value: Value,
    location: impl FnOnce() -> String,
    structure: &str,
) -> Result<Value, PluginError> {
    match value {
        Value::Frame(frame) => Ok(Value::Frame(frame.without_system_columns()?)),
        Value::Null => Ok(Value::Null),
        other @ (Value::Path(_) | Value::List(_)) => {
            Err(frame_shape_error(location(), other.type_name(), &structure))
        }
    }
}

/// Run a destination plugin for one invocation.
///
/// # Errors
///
/// Fails with [`PluginError::ArityMismatch`] before any I/O when the number
/// of results differs from the configured targets, with
/// [`PluginError::TypeShape`] for malformed results, and propagates plugin
/// failures.
pub fn run_destination<P: DestinationPlugin>(
    plugin: &mut P,
    context: &ExecutionContext,
    results: ResultsCollection,
) -> Result<(), PluginError> {
    let _entered = context.logger().clone().entered();
    tracing::info!(
        plugin = P::IDENTIFIER,
        kind = %PluginKind::Destination,
        mode = ?P::STREAM_MODE,
        results = results.len(),
        "Running destination plugin"
    );

    if let Some(targets) = plugin.targets() {
        if targets.len() != results.len() {
            return Err(PluginError::ArityMismatch {
                expected: targets.len(),
                actual: results.len(),
                targets: targets.to_vec(),
            });
        }
    }

    let values = prepare_results(results)?;
    match P::STREAM_MODE {
        StreamMode::Default => default_stream(plugin, context, &values)?,
        StreamMode::Custom => {
            let lent = passes_context(P::STREAM_MODE, P::STREAM_REQUIRES_CONTEXT).then_some(context);
            plugin.stream(context.paths().output_folder(), values, lent)?;
        }
    }
    tracing::info!(plugin = P::IDENTIFIER, "Destination plugin completed");
    Ok(())
}
