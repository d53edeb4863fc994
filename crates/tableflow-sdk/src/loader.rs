//! Turning materialized files into frames.

use std::fs::File;
use std::path::Path;

use arrow::ipc::reader::FileReader;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::errors::PluginError;
use crate::frame::Frame;

/// Converts a local file into a [`Frame`].
///
/// `position` is the file's index within the current load; implementations
/// stamp it into the frame's provenance column.
pub trait FrameLoader: Send + Sync {
    /// # Errors
    ///
    /// Returns [`PluginError::Load`] or [`PluginError::UnsupportedFormat`]
    /// when the file cannot be read as a frame.
    fn load(&self, location: &Path, position: u64) -> Result<Frame, PluginError>;
}

/// Format recognised from a file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Parquet,
    ArrowIpc,
}

impl FileFormat {
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "parquet" => Some(Self::Parquet),
            "arrow" | "ipc" => Some(Self::ArrowIpc),
            _ => None,
        }
    }
}

/// Loads Parquet and Arrow IPC files from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFrameLoader;

impl FileFrameLoader {
    fn read_parquet(location: &Path) -> Result<Frame, PluginError> {
        let file = File::open(location).map_err(|e| PluginError::load(location, e))?;
        let builder =
            ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| PluginError::load(location, e))?;
        let schema = builder.schema().clone();
        let reader = builder.build().map_err(|e| PluginError::load(location, e))?;
        let batches = reader
            .collect::<Result<Vec<RecordBatch>, _>>()
            .map_err(|e| PluginError::load(location, e))?;
        Frame::try_new(schema, batches).map_err(|e| PluginError::load(location, e))
    }

    fn read_ipc(location: &Path) -> Result<Frame, PluginError> {
        let file = File::open(location).map_err(|e| PluginError::load(location, e))?;
        let reader = FileReader::try_new(file, None).map_err(|e| PluginError::load(location, e))?;
        let schema = reader.schema();
        let batches = reader
            .collect::<Result<Vec<RecordBatch>, _>>()
            .map_err(|e| PluginError::load(location, e))?;
        Frame::try_new(schema, batches).map_err(|e| PluginError::load(location, e))
    }
}

impl FrameLoader for FileFrameLoader {
    fn load(&self, location: &Path, position: u64) -> Result<Frame, PluginError> {
        let frame = match FileFormat::from_path(location) {
            Some(FileFormat::Parquet) => Self::read_parquet(location)?,
            Some(FileFormat::ArrowIpc) => Self::read_ipc(location)?,
            None => {
                return Err(PluginError::UnsupportedFormat {
                    path: location.to_path_buf(),
                })
            }
        };
        tracing::debug!(
            path = %location.display(),
            position,
            rows = frame.num_rows(),
            "Loaded frame"
        );
        Ok(frame.with_system_columns(position)?)
    }
}
