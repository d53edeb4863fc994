//! Orchestration of tableflow function runs.

pub mod checkpoint;
pub mod config;
pub mod errors;
pub mod function;
pub mod orchestrator;
pub(crate) mod resolve;
pub mod result;
pub mod runner;

// Re-export public API for convenience
pub use errors::PipelineError;
pub use function::{identity, FnFunction, UserFunction};
pub use orchestrator::{reset_checkpoint, run_configured, show_checkpoint};
pub use result::RunResult;
pub use runner::{run_function, RunOptions};
