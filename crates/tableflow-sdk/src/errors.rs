//! Plugin protocol error model.
//!
//! [`PluginError`] covers the failures the protocol itself raises
//! (missing extension points, malformed values, result arity) and carries
//! a concrete plugin's own failures through unchanged.

use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

/// Boxed error raised by a concrete plugin's own I/O.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Broad classification of a [`PluginError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Neither `chunk` nor `stream` was implemented.
    NotImplemented,
    /// A value crossing the plugin boundary does not match the expected shape.
    TypeShape,
    /// Result count does not match the configured destination targets.
    Arity,
    /// A file could not be turned into a frame.
    Load,
    /// Local file or Arrow/Parquet encoding failure inside the protocol.
    Io,
    /// A plugin was configured with invalid settings.
    Config,
    /// Failure raised by the concrete plugin itself.
    Connector,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotImplemented => "not_implemented",
            Self::TypeShape => "type_shape",
            Self::Arity => "arity",
            Self::Load => "load",
            Self::Io => "io",
            Self::Config => "config",
            Self::Connector => "connector",
        };
        f.write_str(s)
    }
}

/// Error raised while running a source or destination plugin.
///
/// None of these are retried by the protocol; the caller owns retry policy.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PluginError {
    #[error(
        "{plugin} does not implement `{method}`: a plugin must implement exactly one of `chunk` or `stream`"
    )]
    NotImplemented {
        plugin: &'static str,
        method: &'static str,
    },

    #[error("invalid value at {location}: expected {expected}, found {found}; returned value: {structure}")]
    TypeShape {
        location: String,
        expected: &'static str,
        found: &'static str,
        structure: String,
    },

    #[error(
        "destination expects {expected} result(s) for targets [{}], got {actual}",
        .targets.join(", ")
    )]
    ArityMismatch {
        expected: usize,
        actual: usize,
        targets: Vec<String>,
    },

    #[error("unsupported frame file format: {}", .path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("failed to load frame from {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("invalid plugin config: {0}")]
    Config(String),

    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("parquet error: {0}")]
    Parquet(#[from] ParquetError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Connector(BoxError),
}

impl PluginError {
    /// Missing extension point on plugin type `P`.
    #[must_use]
    pub fn not_implemented<P: ?Sized>(method: &'static str) -> Self {
        Self::NotImplemented {
            plugin: std::any::type_name::<P>(),
            method,
        }
    }

    /// Wrap an error raised by a concrete plugin's own I/O.
    pub fn connector(error: impl Into<BoxError>) -> Self {
        Self::Connector(error.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Failure loading the file at `path` into a frame.
    pub fn load(path: impl Into<PathBuf>, error: impl Into<BoxError>) -> Self {
        Self::Load {
            path: path.into(),
            source: error.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotImplemented { .. } => ErrorKind::NotImplemented,
            Self::TypeShape { .. } => ErrorKind::TypeShape,
            Self::ArityMismatch { .. } => ErrorKind::Arity,
            Self::UnsupportedFormat { .. } | Self::Load { .. } => ErrorKind::Load,
            Self::Arrow(_) | Self::Parquet(_) | Self::Io(_) => ErrorKind::Io,
            Self::Config(_) => ErrorKind::Config,
            Self::Connector(_) => ErrorKind::Connector,
        }
    }
}
