//! Identity and dispatch metadata shared by both plugin roles.

use std::fmt;

/// Which `stream` implementation a plugin uses.
///
/// Plugins that only implement `chunk` keep [`StreamMode::Default`] and get
/// the library's loading/writing behaviour. Plugins that override `stream`
/// declare [`StreamMode::Custom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StreamMode {
    #[default]
    Default,
    Custom,
}

/// Plugin role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginKind {
    Source,
    Destination,
}

impl PluginKind {
    /// Tag identifying the plugin family in registrations and logs.
    #[must_use]
    pub fn family_tag(self) -> &'static str {
        match self {
            Self::Source => "source-plugin",
            Self::Destination => "destination-plugin",
        }
    }
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.family_tag())
    }
}

/// Whether the execution context is lent to the plugin for this call.
///
/// The default stream always needs it (for the loader); a custom stream
/// only receives it on request.
pub(crate) fn passes_context(mode: StreamMode, requires_context: bool) -> bool {
    match mode {
        StreamMode::Default => true,
        StreamMode::Custom => requires_context,
    }
}
