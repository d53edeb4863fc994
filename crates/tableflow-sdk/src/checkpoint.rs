//! Incremental checkpoint (offset) protocol for source plugins.
//!
//! Per invocation the checkpoint moves through three states:
//!
//! * **seed**: the values carried over from the previous committed run, or
//!   the plugin's registration-time values when resumption is disabled or
//!   nothing has been committed yet;
//! * **active**: the plugin reads and replaces the mapping through its
//!   [`Offset`] handle while `chunk` or `stream` runs;
//! * **committed**: a non-empty mapping published by the plugin becomes the
//!   next seed. An untouched or empty mapping commits nothing.

use tableflow_types::checkpoint::InitialValues;

/// Checkpoint state of one source invocation.
///
/// Owned by the [`ExecutionContext`](crate::context::ExecutionContext) and
/// read back by the orchestrator once the invocation finishes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckpointState {
    current: Option<InitialValues>,
    use_decorator_values: bool,
    committed: Option<InitialValues>,
}

impl CheckpointState {
    /// Resume from the previous run's committed values, if any.
    #[must_use]
    pub fn resume(current: Option<InitialValues>) -> Self {
        Self {
            current,
            use_decorator_values: false,
            committed: None,
        }
    }

    /// Always seed from the plugin's registration-time values.
    #[must_use]
    pub fn decorator_values() -> Self {
        Self {
            current: None,
            use_decorator_values: true,
            committed: None,
        }
    }

    /// Values carried over from the previous run.
    #[must_use]
    pub fn current(&self) -> Option<&InitialValues> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn use_decorator_values(&self) -> bool {
        self.use_decorator_values
    }

    /// Whether the invocation produced values the orchestrator must persist.
    #[must_use]
    pub fn returns_values(&self) -> bool {
        self.committed.is_some()
    }

    #[must_use]
    pub fn committed(&self) -> Option<&InitialValues> {
        self.committed.as_ref()
    }

    #[must_use]
    pub fn into_committed(self) -> Option<InitialValues> {
        self.committed
    }

    /// Build the plugin's offset handle for this invocation.
    ///
    /// `registered` are the plugin's registration-time values.
    #[must_use]
    pub fn seed(&self, registered: InitialValues) -> Offset {
        match (&self.current, self.use_decorator_values) {
            (Some(current), false) => Offset::new(current.clone()),
            (_, true) | (None, false) => Offset::new(registered),
        }
    }

    /// Commit whatever the plugin published. Returns `true` if new values
    /// must be persisted.
    pub fn commit(&mut self, offset: Offset) -> bool {
        self.committed = offset.into_published().filter(|values| !values.is_empty());
        self.committed.is_some()
    }
}

/// A source plugin's view of the checkpoint during one call.
///
/// [`Offset::initial_values`] returns the last published mapping, or the
/// seed if nothing was published. [`Offset::set_initial_values`] replaces the
/// whole mapping; it is never merged with the seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offset {
    seed: InitialValues,
    published: Option<InitialValues>,
}

impl Offset {
    #[must_use]
    pub fn new(seed: InitialValues) -> Self {
        Self {
            seed,
            published: None,
        }
    }

    #[must_use]
    pub fn initial_values(&self) -> &InitialValues {
        self.published.as_ref().unwrap_or(&self.seed)
    }

    pub fn set_initial_values(&mut self, values: impl Into<InitialValues>) {
        self.published = Some(values.into());
    }

    /// Values this invocation started from.
    #[must_use]
    pub fn seed(&self) -> &InitialValues {
        &self.seed
    }

    #[must_use]
    pub fn is_published(&self) -> bool {
        self.published.is_some()
    }

    #[must_use]
    pub fn into_published(self) -> Option<InitialValues> {
        self.published
    }
}
