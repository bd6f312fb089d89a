//! Tabular storage (Arrow/Parquet)
//!
//! The feature-engineering pipeline writes one row per track: an id column,
//! numeric feature columns and one 0/1 column per genre. This module reads
//! those tables into memory as Arrow record batches; [`crate::dataset`]
//! turns them into a [`Dataset`](crate::dataset::Dataset).
//!
//! Append-only: batches can be added, never updated in place.

use crate::{Error, Result};
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use std::path::Path;

/// In-memory table made of Arrow record batches sharing one schema
#[derive(Debug, Default)]
pub struct StorageEngine {
    batches: Vec<RecordBatch>,
}

impl StorageEngine {
    /// Create a storage engine from existing batches
    ///
    /// Useful for testing and benchmarking
    #[must_use]
    pub fn new(batches: Vec<RecordBatch>) -> Self {
        Self { batches }
    }

    /// Load table from Parquet file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load_parquet<P: AsRef<Path>>(path: P) -> Result<Self> {
        use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
        use std::fs::File;

        let file = File::open(path.as_ref())
            .map_err(|e| Error::Storage(format!("Failed to open Parquet file: {e}")))?;

        let builder = ParquetRecordBatchReaderBuilder::try_new(file)
            .map_err(|e| Error::Storage(format!("Failed to parse Parquet file: {e}")))?;

        let reader = builder
            .build()
            .map_err(|e| Error::Storage(format!("Failed to create Parquet reader: {e}")))?;

        let mut table = Self::default();
        for batch in reader {
            let batch =
                batch.map_err(|e| Error::Storage(format!("Failed to read record batch: {e}")))?;
            table.append_batch(batch)?;
        }

        tracing::debug!(
            path = %path.as_ref().display(),
            batches = table.batches.len(),
            rows = table.num_rows(),
            "loaded parquet table"
        );
        Ok(table)
    }

    /// Write all batches to a Parquet file
    ///
    /// # Errors
    /// Returns error if the table is empty or the file cannot be written
    pub fn write_parquet<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        use parquet::arrow::ArrowWriter;
        use std::fs::File;

        let schema = self
            .schema()
            .ok_or_else(|| Error::EmptyInput("no record batches to write".to_string()))?;
        let file = File::create(path.as_ref())?;
        let mut writer = ArrowWriter::try_new(file, schema, None)
            .map_err(|e| Error::Storage(format!("Failed to create Parquet writer: {e}")))?;
        for batch in &self.batches {
            writer
                .write(batch)
                .map_err(|e| Error::Storage(format!("Failed to write record batch: {e}")))?;
        }
        writer
            .close()
            .map_err(|e| Error::Storage(format!("Failed to finalize Parquet file: {e}")))?;
        Ok(())
    }

    /// Get all record batches
    #[must_use]
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// Schema shared by all batches, if any are loaded
    #[must_use]
    pub fn schema(&self) -> Option<SchemaRef> {
        self.batches.first().map(RecordBatch::schema)
    }

    /// Total number of rows across batches
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    /// Append a batch
    ///
    /// # Errors
    ///
    /// Returns error if batch schema doesn't match existing batches
    pub fn append_batch(&mut self, batch: RecordBatch) -> Result<()> {
        if let Some(existing_schema) = self.schema() {
            if batch.schema() != existing_schema {
                return Err(Error::Storage(format!(
                    "Schema mismatch: expected {:?}, got {:?}",
                    existing_schema,
                    batch.schema()
                )));
            }
        }

        self.batches.push(batch);
        Ok(())
    }
}
