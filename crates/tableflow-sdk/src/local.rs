//! Built-in plugins backed by the local filesystem.

mod destination;
mod source;

pub use destination::{LocalDestinationConfig, LocalFileDestination};
pub use source::{IncrementalConfig, LocalFileSource, LocalSourceConfig, LAST_FILE_KEY};

use std::fs;
use std::path::Path;

use crate::errors::PluginError;

/// A bare file name: non-empty, no directory components.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name)
}

/// Move `from` to `to`, copying when a rename is not possible (e.g. across
/// filesystems).
fn move_file(from: &Path, to: &Path) -> Result<(), PluginError> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to).map_err(PluginError::connector)?;
    fs::remove_file(from).map_err(PluginError::connector)
}
