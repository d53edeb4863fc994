//! Convenience re-exports for plugin authors.
//!
//! ```ignore
//! use tableflow_sdk::prelude::*;
//! ```

// Plugin traits and entry points
pub use crate::destination::{run_destination, DestinationPlugin};
pub use crate::plugin::{PluginKind, StreamMode};
pub use crate::source::{run_source, SourcePlugin};

// Context and checkpoint
pub use crate::checkpoint::{CheckpointState, Offset};
pub use crate::context::ExecutionContext;
pub use tableflow_types::checkpoint::InitialValues;

// Errors
pub use crate::errors::{ErrorKind, PluginError};

// Data crossing the boundary
pub use crate::frame::Frame;
pub use crate::loader::{FileFrameLoader, FrameLoader};
pub use crate::results::{NamedResult, ResultsCollection};
pub use crate::value::{Param, Value};

// Arrow re-export so plugins build frames against the same version
pub use arrow;
