//! Function run error model.

use tableflow_sdk::errors::{ErrorKind, PluginError};
use tableflow_sdk::plugin::PluginKind;
use tableflow_state::StateError;

/// Categorized error for a function run.
///
/// `Plugin` wraps a [`PluginError`] with the role and identifier of the
/// plugin that raised it. `Infrastructure` wraps opaque host-side errors
/// (working directory setup, state backend creation, config resolution).
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{kind} '{plugin}' failed: {source}")]
    Plugin {
        kind: PluginKind,
        plugin: &'static str,
        #[source]
        source: PluginError,
    },

    #[error("function '{function}' declares {expected} parameter(s) but the source produced {actual}")]
    ParameterMismatch {
        function: String,
        expected: usize,
        actual: usize,
    },

    #[error("function '{function}' declares {expected} output(s) but returned {actual}")]
    OutputMismatch {
        function: String,
        expected: usize,
        actual: usize,
    },

    #[error("function '{function}' failed: {source}")]
    Function {
        function: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("state backend error: {0}")]
    State(#[from] StateError),

    #[error(transparent)]
    Infrastructure(#[from] anyhow::Error),
}

impl PipelineError {
    pub(crate) fn source_plugin(plugin: &'static str, source: PluginError) -> Self {
        Self::Plugin {
            kind: PluginKind::Source,
            plugin,
            source,
        }
    }

    pub(crate) fn destination_plugin(plugin: &'static str, source: PluginError) -> Self {
        Self::Plugin {
            kind: PluginKind::Destination,
            plugin,
            source,
        }
    }

    /// Returns the plugin error if this is a `Plugin` variant.
    pub fn as_plugin_error(&self) -> Option<&PluginError> {
        match self {
            Self::Plugin { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Classification of the underlying plugin error, if any.
    pub fn plugin_error_kind(&self) -> Option<ErrorKind> {
        self.as_plugin_error().map(PluginError::kind)
    }
}
