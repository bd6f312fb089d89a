//! Per-fold feature standardisation
//!
//! Scalers are fitted on a fold's training partition only and then applied to
//! both partitions, so no test-set statistics leak into training.

use crate::dataset::FeatureMatrix;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Which feature columns to standardise before fitting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scaling {
    /// Leave features untouched
    #[default]
    None,
    /// Standardise every feature column
    All,
    /// Standardise the named feature columns
    Columns(Vec<String>),
}

impl Scaling {
    /// Resolve to column indices against a feature vocabulary.
    ///
    /// Returns `None` when no scaling is requested.
    ///
    /// # Errors
    ///
    /// Returns `MissingColumns` for names absent from `feature_names`.
    pub fn resolve(&self, feature_names: &[String]) -> Result<Option<Vec<usize>>> {
        match self {
            Self::None => Ok(None),
            Self::All => Ok(Some((0..feature_names.len()).collect())),
            Self::Columns(names) => {
                let mut indices = Vec::with_capacity(names.len());
                let mut missing = Vec::new();
                for name in names {
                    match feature_names.iter().position(|f| f == name) {
                        Some(i) => indices.push(i),
                        None => missing.push(name.clone()),
                    }
                }
                if missing.is_empty() {
                    Ok(Some(indices))
                } else {
                    Err(Error::MissingColumns(missing))
                }
            }
        }
    }
}

/// Zero-mean, unit-variance scaler over selected columns.
///
/// Uses the population standard deviation; constant columns are only centred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    columns: Vec<usize>,
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Fit on `features`, scaling only `columns`.
    ///
    /// # Errors
    ///
    /// - `EmptyInput` if `features` has no rows
    /// - `IndexOutOfRange` if a column index exceeds the feature count
    pub fn fit(features: &FeatureMatrix, columns: &[usize]) -> Result<Self> {
        if features.n_rows() == 0 {
            return Err(Error::EmptyInput("cannot fit scaler on zero rows".to_string()));
        }
        #[allow(clippy::cast_precision_loss)]
        let n = features.n_rows() as f64;

        let mut means = Vec::with_capacity(columns.len());
        let mut scales = Vec::with_capacity(columns.len());
        for &j in columns {
            if j >= features.n_cols() {
                return Err(Error::IndexOutOfRange {
                    index: j,
                    len: features.n_cols(),
                });
            }
            let mean = features.column(j).sum::<f64>() / n;
            let variance = features.column(j).map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let std = variance.sqrt();
            means.push(mean);
            scales.push(if std > f64::EPSILON { std } else { 1.0 });
        }

        Ok(Self {
            columns: columns.to_vec(),
            means,
            scales,
        })
    }

    /// Apply the fitted transform, returning a new matrix.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if `features` has fewer columns than the
    /// scaler was fitted on.
    pub fn transform(&self, features: &FeatureMatrix) -> Result<FeatureMatrix> {
        let n_cols = features.n_cols();
        if let Some(&j) = self.columns.iter().find(|&&j| j >= n_cols) {
            return Err(Error::IndexOutOfRange { index: j, len: n_cols });
        }
        let mut scaled = features.clone();
        for row in scaled.values_mut().chunks_exact_mut(n_cols) {
            for ((&j, mean), scale) in self.columns.iter().zip(&self.means).zip(&self.scales) {
                row[j] = (row[j] - mean) / scale;
            }
        }
        Ok(scaled)
    }
}
