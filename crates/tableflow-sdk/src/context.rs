//! Run-scoped execution context.
//!
//! The orchestrator builds one [`ExecutionContext`] per plugin invocation
//! and lends it to the plugin by shared reference for the duration of that
//! call only. Checkpoint results are read back with
//! [`ExecutionContext::into_status`] once the call has returned.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::checkpoint::CheckpointState;
use crate::loader::{FileFrameLoader, FrameLoader};

/// Filesystem locations available to a plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextPaths {
    output_folder: PathBuf,
}

impl ContextPaths {
    /// Working directory where intermediate files are materialized.
    #[must_use]
    pub fn output_folder(&self) -> &Path {
        &self.output_folder
    }
}

/// Run status carried by the context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextStatus {
    offset: CheckpointState,
}

impl ContextStatus {
    #[must_use]
    pub fn offset(&self) -> &CheckpointState {
        &self.offset
    }

    pub(crate) fn offset_mut(&mut self) -> &mut CheckpointState {
        &mut self.offset
    }

    #[must_use]
    pub fn into_offset(self) -> CheckpointState {
        self.offset
    }
}

/// Handle for one plugin invocation.
pub struct ExecutionContext {
    paths: ContextPaths,
    status: ContextStatus,
    logger: tracing::Span,
    loader: Box<dyn FrameLoader>,
}

impl ExecutionContext {
    /// Context writing to `output_folder`, loading files with
    /// [`FileFrameLoader`] and logging under the current span.
    pub fn new(output_folder: impl Into<PathBuf>, offset: CheckpointState) -> Self {
        Self {
            paths: ContextPaths {
                output_folder: output_folder.into(),
            },
            status: ContextStatus { offset },
            logger: tracing::Span::current(),
            loader: Box::new(FileFrameLoader),
        }
    }

    #[must_use]
    pub fn with_loader(mut self, loader: impl FrameLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    #[must_use]
    pub fn with_logger(mut self, logger: tracing::Span) -> Self {
        self.logger = logger;
        self
    }

    #[must_use]
    pub fn paths(&self) -> &ContextPaths {
        &self.paths
    }

    #[must_use]
    pub fn status(&self) -> &ContextStatus {
        &self.status
    }

    pub(crate) fn status_mut(&mut self) -> &mut ContextStatus {
        &mut self.status
    }

    /// Span plugin runs are recorded under.
    #[must_use]
    pub fn logger(&self) -> &tracing::Span {
        &self.logger
    }

    #[must_use]
    pub fn loader(&self) -> &dyn FrameLoader {
        self.loader.as_ref()
    }

    /// Consume the context, keeping only what the orchestrator reads back.
    #[must_use]
    pub fn into_status(self) -> ContextStatus {
        self.status
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("paths", &self.paths)
            .field("status", &self.status)
            .field("logger", &self.logger)
            .finish_non_exhaustive()
    }
}
