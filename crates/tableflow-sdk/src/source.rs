//! Source plugins: produce the positional parameters of a user function.
//!
//! A source implements exactly one of two extension points:
//!
//! * [`SourcePlugin::chunk`] materializes files into the working directory
//!   and returns their paths; the library loads them into frames.
//! * [`SourcePlugin::stream`] returns frames directly. Such plugins set
//!   [`SourcePlugin::STREAM_MODE`] to [`StreamMode::Custom`].
//!
//! [`run_source`] drives either one, seeds and commits the checkpoint, and
//! validates what comes back.

use std::path::Path;

use tableflow_types::checkpoint::InitialValues;

use crate::checkpoint::Offset;
use crate::context::ExecutionContext;
use crate::errors::PluginError;
use crate::plugin::{passes_context, PluginKind, StreamMode};
use crate::value::{validate_chunk_output, validate_frame_output, Value};

/// Ingestion plugin.
pub trait SourcePlugin {
    /// Stable identifier of this plugin kind.
    const IDENTIFIER: &'static str;

    /// [`StreamMode::Custom`] when [`SourcePlugin::stream`] is overridden.
    const STREAM_MODE: StreamMode = StreamMode::Default;

    /// A custom `stream` receives the execution context only when this is set.
    const STREAM_REQUIRES_CONTEXT: bool = false;

    /// Paths returned by `chunk` are absolute or remote and are loaded as-is
    /// rather than relative to the working directory.
    const STREAM_IGNORE_WORKING_DIR: bool = false;

    /// Registration-time checkpoint values.
    ///
    /// Seed the offset on the first run, or on every run when the function
    /// is registered with `use_decorator_values`.
    fn initial_values(&self) -> InitialValues {
        InitialValues::new()
    }

    /// Materialize input files under `working_dir` and return their paths.
    ///
    /// A single path or null is one positional parameter. A [`Value::List`]
    /// is the ordered parameter list, and a list at one of its positions
    /// binds several files to that parameter.
    ///
    /// # Errors
    ///
    /// The default implementation fails with [`PluginError::NotImplemented`].
    fn chunk(&mut self, working_dir: &Path, offset: &mut Offset) -> Result<Value, PluginError> {
        let _ = (working_dir, offset);
        Err(PluginError::not_implemented::<Self>("chunk"))
    }

    /// Produce the positional parameters directly as frames.
    ///
    /// # Errors
    ///
    /// The default implementation fails with [`PluginError::NotImplemented`].
    fn stream(
        &mut self,
        working_dir: &Path,
        offset: &mut Offset,
        context: Option<&ExecutionContext>,
    ) -> Result<Vec<Value>, PluginError> {
        let _ = (working_dir, offset, context);
        Err(PluginError::not_implemented::<Self>("stream"))
    }
}

/// Stream built on `chunk`: validate the returned paths, then load each file
/// through the context's loader, keeping positions.
///
/// Loaded frames are stamped with their index in this load, counting files
/// in positional order.
///
/// # Errors
///
/// Propagates `chunk` failures, [`PluginError::TypeShape`] for malformed
/// returns, and loader failures.
pub fn default_stream<P: SourcePlugin + ?Sized>(
    plugin: &mut P,
    context: &ExecutionContext,
    offset: &mut Offset,
) -> Result<Vec<Value>, PluginError> {
    let working_dir = context.paths().output_folder();
    let params = validate_chunk_output(plugin.chunk(working_dir, offset)?)?;

    let loader = context.loader();
    let mut next_position = 0u64;
    let mut values = Vec::with_capacity(params.len());
    for param in params {
        let frames = param.try_map(|path| {
            let location = if P::STREAM_IGNORE_WORKING_DIR {
                path
            } else {
                working_dir.join(path)
            };
            let frame = loader.load(&location, next_position);
            next_position += 1;
            frame
        })?;
        values.push(Value::from(frames));
    }
    tracing::debug!(
        plugin = P::IDENTIFIER,
        parameters = values.len(),
        files = next_position,
        "Loaded chunk output"
    );
    Ok(values)
}

/// Run a source plugin for one invocation.
///
/// On success the context's checkpoint state holds any values the plugin
/// published, and the returned list has one entry per function parameter.
///
/// # Errors
///
/// Propagates plugin failures. Fails with [`PluginError::TypeShape`] if the
/// returned list is not made of frames, nulls, and flat lists of those.
pub fn run_source<P: SourcePlugin>(
    plugin: &mut P,
    context: &mut ExecutionContext,
) -> Result<Vec<Value>, PluginError> {
    let _entered = context.logger().clone().entered();
    tracing::info!(
        plugin = P::IDENTIFIER,
        kind = %PluginKind::Source,
        mode = ?P::STREAM_MODE,
        output_folder = %context.paths().output_folder().display(),
        "Running source plugin"
    );

    let mut offset = context.status().offset().seed(plugin.initial_values());
    tracing::debug!(seed = %offset.seed(), "Seeded offset");

    let values = {
        let ctx: &ExecutionContext = context;
        match P::STREAM_MODE {
            StreamMode::Default => default_stream(plugin, ctx, &mut offset)?,
            StreamMode::Custom => {
                let lent = passes_context(P::STREAM_MODE, P::STREAM_REQUIRES_CONTEXT).then_some(ctx);
                plugin.stream(ctx.paths().output_folder(), &mut offset, lent)?
            }
        }
    };

    let committed = context.status_mut().offset_mut().commit(offset);
    if let Some(published) = context.status().offset().committed() {
        tracing::info!(plugin = P::IDENTIFIER, values = %published, "Source published new offset");
    } else {
        tracing::debug!(plugin = P::IDENTIFIER, committed, "Source left offset unchanged");
    }

    validate_frame_output(&values)?;
    tracing::info!(
        plugin = P::IDENTIFIER,
        parameters = values.len(),
        frames = values.iter().map(|v| v.frames().count()).sum::<usize>(),
        "Source plugin completed"
    );
    Ok(values)
}
