//! Build a [`Dataset`] from Arrow record batches or Parquet files

use super::{Dataset, FeatureMatrix, LabelMatrix};
use crate::storage::StorageEngine;
use crate::{Error, Result};
use arrow::array::{Array, ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use std::path::Path;

impl Dataset {
    /// Build a dataset from record batches.
    ///
    /// Feature columns may be any numeric type and are cast to `f64`. Label
    /// columns may be boolean or integer 0/1. The id column may be a string
    /// or integer column.
    ///
    /// # Errors
    ///
    /// - `EmptyInput` if there are no batches or no rows
    /// - `Storage` if the batches do not share one schema
    /// - `MissingColumns` listing every requested column the schema lacks
    /// - `InvalidInput` on nulls, non-binary labels, or uncastable columns
    /// - plus every error of [`Dataset::new`]
    pub fn from_record_batches(
        batches: &[RecordBatch],
        id_column: &str,
        feature_columns: &[&str],
        label_columns: &[&str],
    ) -> Result<Self> {
        let mut table = StorageEngine::default();
        for batch in batches {
            table.append_batch(batch.clone())?;
        }
        let schema = table
            .schema()
            .ok_or_else(|| Error::EmptyInput("no record batches".to_string()))?;

        let missing: Vec<String> = std::iter::once(&id_column)
            .chain(feature_columns)
            .chain(label_columns)
            .filter(|name| schema.index_of(name).is_err())
            .map(|name| (*name).to_string())
            .collect();
        if !missing.is_empty() {
            return Err(Error::MissingColumns(missing));
        }

        let mut ids = Vec::new();
        let mut features = Vec::new();
        let mut labels = Vec::new();

        for batch in table.batches() {
            let id_array = column_as(batch, id_column, &DataType::Utf8)?;
            let id_array = downcast::<StringArray>(&id_array, id_column)?;
            ids.extend(id_array.iter().flatten().map(str::to_string));

            let feature_arrays = feature_columns
                .iter()
                .map(|name| column_as(batch, name, &DataType::Float64))
                .collect::<Result<Vec<_>>>()?;
            let feature_arrays = feature_arrays
                .iter()
                .zip(feature_columns)
                .map(|(array, name)| downcast::<Float64Array>(array, name))
                .collect::<Result<Vec<_>>>()?;

            let label_arrays = label_columns
                .iter()
                .map(|name| label_column(batch, name))
                .collect::<Result<Vec<_>>>()?;

            for row in 0..batch.num_rows() {
                features.extend(feature_arrays.iter().map(|a| a.value(row)));
                labels.extend(label_arrays.iter().map(|column| column[row]));
            }
        }

        let n_rows = ids.len();
        tracing::debug!(
            rows = n_rows,
            features = feature_columns.len(),
            labels = label_columns.len(),
            "ingested record batches"
        );

        Self::new(
            ids,
            feature_columns.iter().map(|s| (*s).to_string()).collect(),
            label_columns.iter().map(|s| (*s).to_string()).collect(),
            FeatureMatrix::new(n_rows, feature_columns.len(), features)?,
            LabelMatrix::new(n_rows, label_columns.len(), labels)?,
        )
    }

    /// Build a dataset from a Parquet file.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the file cannot be read, otherwise the errors of
    /// [`Dataset::from_record_batches`].
    pub fn from_parquet<P: AsRef<Path>>(
        path: P,
        id_column: &str,
        feature_columns: &[&str],
        label_columns: &[&str],
    ) -> Result<Self> {
        let storage = StorageEngine::load_parquet(path)?;
        Self::from_record_batches(storage.batches(), id_column, feature_columns, label_columns)
    }
}

/// Fetch a column, reject nulls, and cast it to `target`.
fn column_as(batch: &RecordBatch, name: &str, target: &DataType) -> Result<ArrayRef> {
    let column = batch
        .column_by_name(name)
        .ok_or_else(|| Error::MissingColumns(vec![name.to_string()]))?;
    if column.null_count() > 0 {
        return Err(Error::InvalidInput(format!(
            "column '{name}' contains {} nulls",
            column.null_count()
        )));
    }
    cast(column, target)
        .map_err(|e| Error::InvalidInput(format!("column '{name}' cannot be read as {target}: {e}")))
}

fn downcast<'a, T: 'static>(array: &'a ArrayRef, name: &str) -> Result<&'a T> {
    array
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| Error::InvalidInput(format!("column '{name}' has an unexpected type")))
}

/// Read a label column as indicators; integers must be 0 or 1.
fn label_column(batch: &RecordBatch, name: &str) -> Result<Vec<bool>> {
    let column = batch
        .column_by_name(name)
        .ok_or_else(|| Error::MissingColumns(vec![name.to_string()]))?;

    if column.data_type() == &DataType::Boolean {
        if column.null_count() > 0 {
            return Err(Error::InvalidInput(format!("label column '{name}' contains nulls")));
        }
        let values = downcast::<BooleanArray>(column, name)?;
        return Ok(values.iter().flatten().collect());
    }

    let values = column_as(batch, name, &DataType::Int64)?;
    let values = downcast::<Int64Array>(&values, name)?;
    values
        .values()
        .iter()
        .map(|&v| match v {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(Error::InvalidInput(format!(
                "label column '{name}' holds {other}, expected 0 or 1"
            ))),
        })
        .collect()
}
