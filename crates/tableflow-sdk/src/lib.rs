//! Plugin protocol for tableflow functions.
//!
//! A [`SourcePlugin`](source::SourcePlugin) produces the positional
//! parameters of a user function; a
//! [`DestinationPlugin`](destination::DestinationPlugin) persists its
//! results. Both offer a simple file-level `chunk` extension point and a
//! full-control `stream` one.

pub mod checkpoint;
pub mod context;
pub mod destination;
pub mod errors;
pub mod frame;
pub mod loader;
pub mod local;
pub mod plugin;
pub mod prelude;
pub mod results;
pub mod source;
pub mod value;
