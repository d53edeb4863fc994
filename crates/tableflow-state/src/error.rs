//! State backend error types.

/// Errors produced by [`StateBackend`](crate::StateBackend) operations.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// Underlying `SQLite` failure.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// File-system I/O failure (e.g. creating the database directory).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored checkpoint is not a flat string mapping.
    #[error("corrupt checkpoint for function '{function}': {source}")]
    CorruptCheckpoint {
        function: String,
        #[source]
        source: serde_json::Error,
    },

    /// Checkpoint values could not be encoded for storage.
    #[error("failed to encode checkpoint for function '{function}': {source}")]
    EncodeCheckpoint {
        function: String,
        #[source]
        source: serde_json::Error,
    },

    /// Internal mutex was poisoned by a panicked thread.
    #[error("state backend lock poisoned")]
    LockPoisoned,
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, StateError>;
