//! Local directory destination writing Parquet files.

use std::collections::HashSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use parquet::arrow::ArrowWriter;
use serde::Deserialize;

use super::{is_plain_file_name, move_file};
use crate::destination::DestinationPlugin;
use crate::errors::PluginError;
use crate::frame::Frame;
use crate::value::{Param, Value};

/// Local destination config from the function registration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocalDestinationConfig {
    /// Directory the finished files are moved into.
    pub directory: PathBuf,
    /// Table name per function output, in order.
    #[serde(default)]
    pub tables: Vec<String>,
}

impl LocalDestinationConfig {
    /// # Errors
    ///
    /// Returns [`PluginError::Config`] describing the first invalid setting.
    pub fn validate(&self) -> Result<(), PluginError> {
        if self.tables.is_empty() {
            return Err(PluginError::config(
                "local destination must declare at least one table",
            ));
        }
        let mut seen = HashSet::new();
        for table in &self.tables {
            if !is_plain_file_name(table) {
                return Err(PluginError::config(format!(
                    "table '{table}' is not a valid file name"
                )));
            }
            if !seen.insert(table.as_str()) {
                return Err(PluginError::config(format!("duplicate table '{table}'")));
            }
        }
        // A list result for `t` is written as `t_<n>.parquet`, which must not
        // name another table's file.
        for table in &self.tables {
            if let Some(base) = list_member_base(table) {
                if seen.contains(base) {
                    return Err(PluginError::config(format!(
                        "table '{table}' collides with list files of table '{base}'"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// `t` for a name of the form `t_<digits>`.
fn list_member_base(name: &str) -> Option<&str> {
    let (base, index) = name.rsplit_once('_')?;
    (!index.is_empty() && index.bytes().all(|b| b.is_ascii_digit())).then_some(base)
}

/// Writes each result as Parquet, then moves the files into the configured
/// directory.
///
/// A frame result becomes `<table>.parquet`; a list result becomes
/// `<table>_<n>.parquet` per frame. Null results produce no file.
#[derive(Debug, Clone)]
pub struct LocalFileDestination {
    config: LocalDestinationConfig,
}

impl LocalFileDestination {
    /// # Errors
    ///
    /// Returns [`PluginError::Config`] if the config is invalid.
    pub fn new(config: LocalDestinationConfig) -> Result<Self, PluginError> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &LocalDestinationConfig {
        &self.config
    }

    fn write_frame(frame: &Frame, working_dir: &Path, name: String) -> Result<Value, PluginError> {
        let file = File::create(working_dir.join(&name)).map_err(PluginError::connector)?;
        let mut writer = ArrowWriter::try_new(file, frame.schema().clone(), None)?;
        for batch in frame.batches() {
            writer.write(batch)?;
        }
        writer.close()?;
        tracing::debug!(file = %name, rows = frame.num_rows(), "Wrote parquet file");
        Ok(Value::path(name))
    }
}

fn unexpected(table: &str, value: &Value) -> PluginError {
    PluginError::connector(format!(
        "cannot write {} for table '{table}'",
        value.type_name()
    ))
}

impl DestinationPlugin for LocalFileDestination {
    const IDENTIFIER: &'static str = "local-file-destination";

    fn targets(&self) -> Option<&[String]> {
        Some(&self.config.tables)
    }

    fn chunk(&mut self, working_dir: &Path, results: &[Value]) -> Result<Value, PluginError> {
        fs::create_dir_all(working_dir).map_err(PluginError::connector)?;

        let mut positions = Vec::with_capacity(results.len());
        for (table, value) in self.config.tables.iter().zip(results) {
            let position = match value {
                Value::Frame(frame) => {
                    Self::write_frame(frame, working_dir, format!("{table}.parquet"))?
                }
                Value::Null => Value::Null,
                Value::List(items) => Value::List(
                    items
                        .iter()
                        .enumerate()
                        .map(|(n, item)| match item {
                            Value::Frame(frame) => {
                                Self::write_frame(frame, working_dir, format!("{table}_{n}.parquet"))
                            }
                            Value::Null => Ok(Value::Null),
                            other => Err(unexpected(table, other)),
                        })
                        .collect::<Result<_, _>>()?,
                ),
                other @ Value::Path(_) => return Err(unexpected(table, other)),
            };
            positions.push(position);
        }
        Ok(Value::List(positions))
    }

    fn write(&mut self, files: Vec<Param<PathBuf>>) -> Result<(), PluginError> {
        fs::create_dir_all(&self.config.directory).map_err(PluginError::connector)?;
        let mut moved = 0usize;
        for path in files.iter().flat_map(Param::iter) {
            let Some(name) = path.file_name() else {
                return Err(PluginError::connector(format!(
                    "'{}' has no file name",
                    path.display()
                )));
            };
            move_file(path, &self.config.directory.join(name))?;
            moved += 1;
        }
        tracing::info!(
            directory = %self.config.directory.display(),
            files = moved,
            "Delivered results"
        );
        Ok(())
    }
}
