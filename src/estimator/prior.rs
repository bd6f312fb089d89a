//! Label-frequency baseline

use super::{check_fit_shapes, MultiLabelEstimator};
use crate::dataset::{FeatureMatrix, LabelMatrix};
use crate::{Error, Result};

/// Predicts every label that is positive for at least half of the
/// training samples, ignoring the features.
#[derive(Debug, Clone, Default)]
pub struct MajorityPrior {
    prediction: Option<Vec<bool>>,
}

impl MajorityPrior {
    /// Unfitted baseline.
    #[must_use]
    pub const fn new() -> Self {
        Self { prediction: None }
    }
}

impl MultiLabelEstimator for MajorityPrior {
    fn kind(&self) -> &'static str {
        "MajorityPrior"
    }

    fn fit(&mut self, features: &FeatureMatrix, labels: &LabelMatrix) -> Result<()> {
        check_fit_shapes(features, labels.n_rows())?;
        let n = labels.n_rows();
        self.prediction = Some(labels.supports().into_iter().map(|s| 2 * s >= n).collect());
        Ok(())
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<LabelMatrix> {
        let prediction = self
            .prediction
            .as_ref()
            .ok_or_else(|| Error::EstimatorFit("MajorityPrior used before fit".to_string()))?;
        let values = prediction
            .iter()
            .copied()
            .cycle()
            .take(features.n_rows() * prediction.len())
            .collect();
        LabelMatrix::new(features.n_rows(), prediction.len(), values)
    }
}
