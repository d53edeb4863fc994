//! Columnar frames handed across the plugin boundary.
//!
//! A [`Frame`] is an immutable Arrow table: a schema plus record batches.
//! Frames produced by a [`FrameLoader`](crate::loader::FrameLoader) carry
//! reserved system columns prefixed with [`SYSTEM_COLUMN_PREFIX`]; every
//! operation here returns a new frame rather than editing one in place.

use std::fmt;
use std::sync::Arc;

use arrow::array::{ArrayRef, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;

/// Prefix shared by all reserved system columns.
pub const SYSTEM_COLUMN_PREFIX: &str = "$tf.";

/// Provenance index: position of the originating file within its load.
pub const SOURCE_INDEX_COLUMN: &str = "$tf.src";

/// Row marker: row number within the originating file.
pub const ROW_MARKER_COLUMN: &str = "$tf.row";

/// Returns `true` if `name` is a reserved system column.
#[must_use]
pub fn is_system_column(name: &str) -> bool {
    name.starts_with(SYSTEM_COLUMN_PREFIX)
}

/// Immutable columnar table value.
///
/// Cloning is cheap: batches are shared behind an `Arc`.
#[derive(Clone)]
pub struct Frame {
    schema: SchemaRef,
    batches: Arc<[RecordBatch]>,
}

impl Frame {
    /// Build a frame from batches that all share `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`ArrowError::SchemaError`] if any batch has a different schema.
    pub fn try_new(schema: SchemaRef, batches: Vec<RecordBatch>) -> Result<Self, ArrowError> {
        for (i, batch) in batches.iter().enumerate() {
            if batch.schema().fields() != schema.fields() {
                return Err(ArrowError::SchemaError(format!(
                    "batch {i} schema does not match frame schema"
                )));
            }
        }
        Ok(Self {
            schema,
            batches: batches.into(),
        })
    }

    /// Frame holding a single batch.
    #[must_use]
    pub fn from_batch(batch: RecordBatch) -> Self {
        Self {
            schema: batch.schema(),
            batches: vec![batch].into(),
        }
    }

    /// Frame with a schema and no rows.
    #[must_use]
    pub fn empty(schema: SchemaRef) -> Self {
        Self {
            schema,
            batches: Vec::<RecordBatch>::new().into(),
        }
    }

    #[must_use]
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    #[must_use]
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.schema.fields().len()
    }

    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.schema
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect()
    }

    #[must_use]
    pub fn has_system_columns(&self) -> bool {
        self.schema
            .fields()
            .iter()
            .any(|f| is_system_column(f.name()))
    }

    /// New frame without any reserved system column.
    ///
    /// # Errors
    ///
    /// Propagates Arrow projection failures.
    pub fn without_system_columns(&self) -> Result<Self, ArrowError> {
        if !self.has_system_columns() {
            return Ok(self.clone());
        }
        let keep = self.user_column_indices();
        let schema = Arc::new(self.schema.project(&keep)?);
        let batches = self
            .batches
            .iter()
            .map(|b| b.project(&keep))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            schema,
            batches: batches.into(),
        })
    }

    /// New frame with freshly stamped system columns.
    ///
    /// Existing system columns are dropped first. `source_index` is written
    /// to every row of [`SOURCE_INDEX_COLUMN`]; [`ROW_MARKER_COLUMN`] numbers
    /// rows from zero across all batches.
    ///
    /// # Errors
    ///
    /// Propagates Arrow projection or batch construction failures.
    pub fn with_system_columns(&self, source_index: u64) -> Result<Self, ArrowError> {
        let keep = self.user_column_indices();
        let mut fields: Vec<Field> = keep
            .iter()
            .map(|&i| self.schema.field(i).clone())
            .collect();
        fields.push(Field::new(SOURCE_INDEX_COLUMN, DataType::UInt64, false));
        fields.push(Field::new(ROW_MARKER_COLUMN, DataType::UInt64, false));
        let schema = Arc::new(Schema::new_with_metadata(
            fields,
            self.schema.metadata().clone(),
        ));

        let mut next_row = 0u64;
        let mut batches = Vec::with_capacity(self.batches.len());
        for batch in self.batches.iter() {
            let rows = batch.num_rows();
            let mut columns: Vec<ArrayRef> = keep.iter().map(|&i| batch.column(i).clone()).collect();
            columns.push(Arc::new(UInt64Array::from_value(source_index, rows)));
            let end = next_row + rows as u64;
            columns.push(Arc::new(UInt64Array::from_iter_values(next_row..end)));
            next_row = end;
            batches.push(RecordBatch::try_new(schema.clone(), columns)?);
        }
        Ok(Self {
            schema,
            batches: batches.into(),
        })
    }

    fn user_column_indices(&self) -> Vec<usize> {
        self.schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, f)| !is_system_column(f.name()))
            .map(|(i, _)| i)
            .collect()
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("columns", &self.column_names())
            .field("rows", &self.num_rows())
            .finish()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frame(columns={}, rows={})",
            self.num_columns(),
            self.num_rows()
        )
    }
}

impl From<RecordBatch> for Frame {
    fn from(batch: RecordBatch) -> Self {
        Self::from_batch(batch)
    }
}
