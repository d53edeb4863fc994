//! Function run result types.

use tableflow_types::checkpoint::InitialValues;

/// Result of a successful function run.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub run_id: i64,
    /// Positional parameters bound by the source.
    pub parameters: usize,
    pub frames_read: u64,
    pub rows_read: u64,
    /// Non-null results handed to the destination.
    pub results_written: u64,
    /// Checkpoint persisted by this run, if it advanced.
    pub checkpoint: Option<InitialValues>,
    pub source_duration_secs: f64,
    pub function_duration_secs: f64,
    pub dest_duration_secs: f64,
    pub duration_secs: f64,
}

impl RunResult {
    #[must_use]
    pub fn checkpoint_committed(&self) -> bool {
        self.checkpoint.is_some()
    }
}
