//! Shared tableflow model types.
//!
//! This crate is dependency-boundary-safe for both the plugin SDK and the
//! orchestrator-side engine and state crates.

pub mod checkpoint;
pub mod state;
