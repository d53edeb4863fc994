//! Local directory source.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tableflow_types::checkpoint::InitialValues;

use super::is_plain_file_name;
use crate::checkpoint::Offset;
use crate::errors::PluginError;
use crate::source::SourcePlugin;
use crate::value::Value;

/// Checkpoint key holding the greatest file name already ingested.
pub const LAST_FILE_KEY: &str = "last_file";

/// Local source config from the function registration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocalSourceConfig {
    /// Directory the input files are read from.
    pub directory: PathBuf,
    /// One file per positional parameter. A missing file binds null.
    #[serde(default)]
    pub files: Vec<String>,
    /// Trailing parameter receiving every not-yet-ingested file.
    #[serde(default)]
    pub incremental: Option<IncrementalConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IncrementalConfig {
    /// File extension to scan for, with or without a leading dot.
    pub extension: String,
}

impl IncrementalConfig {
    fn matches(&self, path: &Path) -> bool {
        let wanted = self.extension.trim_start_matches('.');
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(wanted))
    }
}

impl LocalSourceConfig {
    /// # Errors
    ///
    /// Returns [`PluginError::Config`] describing the first invalid setting.
    pub fn validate(&self) -> Result<(), PluginError> {
        if self.parameter_count() == 0 {
            return Err(PluginError::config(
                "local source must declare at least one file or an incremental parameter",
            ));
        }
        if let Some(name) = self.files.iter().find(|f| !is_plain_file_name(f)) {
            return Err(PluginError::config(format!(
                "'{name}' is not a plain file name"
            )));
        }
        if let Some(incremental) = &self.incremental {
            if incremental.extension.trim_start_matches('.').is_empty() {
                return Err(PluginError::config("incremental extension must not be empty"));
            }
        }
        Ok(())
    }

    /// Number of positional parameters this source produces.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.files.len() + usize::from(self.incremental.is_some())
    }
}

/// Copies files from a local directory into the working directory.
///
/// Each configured file becomes one positional parameter. With an
/// incremental parameter, every file whose name sorts after the checkpointed
/// [`LAST_FILE_KEY`] is bound to one extra trailing parameter, and the
/// greatest name is published as the next checkpoint.
#[derive(Debug, Clone)]
pub struct LocalFileSource {
    config: LocalSourceConfig,
    initial_values: InitialValues,
}

impl LocalFileSource {
    /// # Errors
    ///
    /// Returns [`PluginError::Config`] if the config is invalid.
    pub fn new(config: LocalSourceConfig) -> Result<Self, PluginError> {
        config.validate()?;
        Ok(Self {
            config,
            initial_values: InitialValues::new(),
        })
    }

    #[must_use]
    pub fn with_initial_values(mut self, values: InitialValues) -> Self {
        self.initial_values = values;
        self
    }

    #[must_use]
    pub fn config(&self) -> &LocalSourceConfig {
        &self.config
    }

    fn stage(&self, name: &str, working_dir: &Path) -> Result<Value, PluginError> {
        let from = self.config.directory.join(name);
        if !from.is_file() {
            tracing::warn!(path = %from.display(), "Input file missing, binding null");
            return Ok(Value::Null);
        }
        fs::copy(&from, working_dir.join(name)).map_err(PluginError::connector)?;
        Ok(Value::path(name))
    }

    /// Names of matching files sorting after `last`, ascending. Files bound
    /// to their own parameter are never part of the scan.
    fn pending_files(
        &self,
        incremental: &IncrementalConfig,
        last: &str,
    ) -> Result<Vec<String>, PluginError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.config.directory).map_err(PluginError::connector)? {
            let path = entry.map_err(PluginError::connector)?.path();
            if !path.is_file() || !incremental.matches(&path) {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name > last && !self.config.files.iter().any(|f| f == name) {
                names.push(name.to_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

impl SourcePlugin for LocalFileSource {
    const IDENTIFIER: &'static str = "local-file-source";

    fn initial_values(&self) -> InitialValues {
        self.initial_values.clone()
    }

    fn chunk(&mut self, working_dir: &Path, offset: &mut Offset) -> Result<Value, PluginError> {
        fs::create_dir_all(working_dir).map_err(PluginError::connector)?;

        let mut positions = Vec::with_capacity(self.config.parameter_count());
        for name in &self.config.files {
            positions.push(self.stage(name, working_dir)?);
        }

        if let Some(incremental) = &self.config.incremental {
            let last = offset.initial_values().get(LAST_FILE_KEY).unwrap_or_default();
            let pending = self.pending_files(incremental, last)?;
            tracing::info!(
                directory = %self.config.directory.display(),
                after = last,
                files = pending.len(),
                "Scanned for new files"
            );

            let staged = pending
                .iter()
                .map(|name| self.stage(name, working_dir))
                .collect::<Result<Vec<_>, _>>()?;
            if let Some(newest) = pending.last() {
                let mut next = offset.initial_values().clone();
                next.insert(LAST_FILE_KEY, newest.as_str());
                offset.set_initial_values(next);
            }
            positions.push(Value::List(staged));
        }

        Ok(Value::List(positions))
    }
}
