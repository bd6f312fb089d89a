//! Dense row-major feature and label matrices

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Engineered numeric features, one row per sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFeatureMatrix")]
pub struct FeatureMatrix {
    n_rows: usize,
    n_cols: usize,
    values: Vec<f64>,
}

impl FeatureMatrix {
    /// Create a matrix from row-major values.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if `values.len() != n_rows * n_cols`, and
    /// `InvalidInput` if `n_cols` is zero.
    pub fn new(n_rows: usize, n_cols: usize, values: Vec<f64>) -> Result<Self> {
        if n_cols == 0 {
            return Err(Error::InvalidInput(
                "feature matrix needs at least one column".to_string(),
            ));
        }
        if values.len() != n_rows * n_cols {
            return Err(Error::ShapeMismatch {
                expected: format!("{n_rows}x{n_cols} ({} values)", n_rows * n_cols),
                actual: format!("{} values", values.len()),
            });
        }
        Ok(Self {
            n_rows,
            n_cols,
            values,
        })
    }

    /// Create a matrix from rows of equal length.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` on ragged rows, `InvalidInput` if the rows are
    /// empty.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let n_cols = rows.first().map_or(0, Vec::len);
        let mut values = Vec::with_capacity(rows.len() * n_cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n_cols {
                return Err(Error::ShapeMismatch {
                    expected: format!("row {i} with {n_cols} features"),
                    actual: format!("{} features", row.len()),
                });
            }
            values.extend_from_slice(row);
        }
        Self::new(rows.len(), n_cols, values)
    }

    /// Number of rows (samples).
    #[must_use]
    pub const fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns (features).
    #[must_use]
    pub const fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Row-major values.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Borrow one row.
    ///
    /// # Panics
    ///
    /// Panics if `i >= n_rows()`.
    #[must_use]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.n_cols..(i + 1) * self.n_cols]
    }

    /// Iterate over rows.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks_exact(self.n_cols)
    }

    /// Iterate over one column.
    pub fn column(&self, j: usize) -> impl Iterator<Item = f64> + '_ {
        self.rows().map(move |row| row[j])
    }

    /// True if every value is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }

    /// Project onto the given rows, in the given order.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` for any index `>= n_rows()`.
    pub fn select_rows(&self, indices: &[usize]) -> Result<Self> {
        let mut values = Vec::with_capacity(indices.len() * self.n_cols);
        for &i in indices {
            check_index(i, self.n_rows)?;
            values.extend_from_slice(self.row(i));
        }
        Ok(Self {
            n_rows: indices.len(),
            n_cols: self.n_cols,
            values,
        })
    }

    /// Append boolean columns (encoded 0.0 / 1.0) to the right.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if a column length differs from `n_rows()`.
    pub fn hstack_indicators(&self, columns: &[Vec<bool>]) -> Result<Self> {
        if let Some(bad) = columns.iter().find(|c| c.len() != self.n_rows) {
            return Err(Error::ShapeMismatch {
                expected: format!("indicator column of length {}", self.n_rows),
                actual: format!("length {}", bad.len()),
            });
        }
        let n_cols = self.n_cols + columns.len();
        let mut values = Vec::with_capacity(self.n_rows * n_cols);
        for (i, row) in self.rows().enumerate() {
            values.extend_from_slice(row);
            values.extend(columns.iter().map(|c| if c[i] { 1.0 } else { 0.0 }));
        }
        Ok(Self {
            n_rows: self.n_rows,
            n_cols,
            values,
        })
    }

    pub(crate) fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }
}

/// Multi-hot label indicators, one row per sample, one column per label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawLabelMatrix")]
pub struct LabelMatrix {
    n_rows: usize,
    n_labels: usize,
    values: Vec<bool>,
}

impl LabelMatrix {
    /// Create a matrix from row-major indicators.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if `values.len() != n_rows * n_labels`, and
    /// `InvalidInput` if `n_labels` is zero.
    pub fn new(n_rows: usize, n_labels: usize, values: Vec<bool>) -> Result<Self> {
        if n_labels == 0 {
            return Err(Error::InvalidInput(
                "label matrix needs at least one label".to_string(),
            ));
        }
        if values.len() != n_rows * n_labels {
            return Err(Error::ShapeMismatch {
                expected: format!("{n_rows}x{n_labels} ({} values)", n_rows * n_labels),
                actual: format!("{} values", values.len()),
            });
        }
        Ok(Self {
            n_rows,
            n_labels,
            values,
        })
    }

    /// Create a matrix from rows of equal length.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` on ragged rows, `InvalidInput` if the rows are
    /// empty.
    pub fn from_rows(rows: &[Vec<bool>]) -> Result<Self> {
        let n_labels = rows.first().map_or(0, Vec::len);
        let mut values = Vec::with_capacity(rows.len() * n_labels);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n_labels {
                return Err(Error::ShapeMismatch {
                    expected: format!("row {i} with {n_labels} labels"),
                    actual: format!("{} labels", row.len()),
                });
            }
            values.extend_from_slice(row);
        }
        Self::new(rows.len(), n_labels, values)
    }

    /// Create a matrix from per-label columns.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if columns differ in length.
    pub fn from_columns(columns: &[Vec<bool>], n_rows: usize) -> Result<Self> {
        if let Some(bad) = columns.iter().find(|c| c.len() != n_rows) {
            return Err(Error::ShapeMismatch {
                expected: format!("label column of length {n_rows}"),
                actual: format!("length {}", bad.len()),
            });
        }
        let values = (0..n_rows)
            .flat_map(|i| columns.iter().map(move |c| c[i]))
            .collect();
        Self::new(n_rows, columns.len(), values)
    }

    /// Number of rows (samples).
    #[must_use]
    pub const fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of labels.
    #[must_use]
    pub const fn n_labels(&self) -> usize {
        self.n_labels
    }

    /// Indicator for sample `i`, label `j`.
    ///
    /// # Panics
    ///
    /// Panics if `i` or `j` is out of range.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> bool {
        assert!(j < self.n_labels, "label index {j} out of range");
        self.values[i * self.n_labels + j]
    }

    /// Borrow one row.
    ///
    /// # Panics
    ///
    /// Panics if `i >= n_rows()`.
    #[must_use]
    pub fn row(&self, i: usize) -> &[bool] {
        &self.values[i * self.n_labels..(i + 1) * self.n_labels]
    }

    /// Iterate over rows.
    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.values.chunks_exact(self.n_labels)
    }

    /// Copy one label column.
    #[must_use]
    pub fn column(&self, j: usize) -> Vec<bool> {
        self.rows().map(|row| row[j]).collect()
    }

    /// Number of positive samples per label.
    #[must_use]
    pub fn supports(&self) -> Vec<usize> {
        let mut counts = vec![0; self.n_labels];
        for row in self.rows() {
            for (count, &positive) in counts.iter_mut().zip(row) {
                *count += usize::from(positive);
            }
        }
        counts
    }

    /// Project onto the given rows, in the given order.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` for any index `>= n_rows()`.
    pub fn select_rows(&self, indices: &[usize]) -> Result<Self> {
        let mut values = Vec::with_capacity(indices.len() * self.n_labels);
        for &i in indices {
            check_index(i, self.n_rows)?;
            values.extend_from_slice(self.row(i));
        }
        Ok(Self {
            n_rows: indices.len(),
            n_labels: self.n_labels,
            values,
        })
    }
}

// Deserialized shapes are re-checked by the constructors.
#[derive(Deserialize)]
struct RawFeatureMatrix {
    n_rows: usize,
    n_cols: usize,
    values: Vec<f64>,
}

impl TryFrom<RawFeatureMatrix> for FeatureMatrix {
    type Error = Error;

    fn try_from(raw: RawFeatureMatrix) -> Result<Self> {
        Self::new(raw.n_rows, raw.n_cols, raw.values)
    }
}

#[derive(Deserialize)]
struct RawLabelMatrix {
    n_rows: usize,
    n_labels: usize,
    values: Vec<bool>,
}

impl TryFrom<RawLabelMatrix> for LabelMatrix {
    type Error = Error;

    fn try_from(raw: RawLabelMatrix) -> Result<Self> {
        Self::new(raw.n_rows, raw.n_labels, raw.values)
    }
}

fn check_index(index: usize, len: usize) -> Result<()> {
    if index >= len {
        return Err(Error::IndexOutOfRange { index, len });
    }
    Ok(())
}
