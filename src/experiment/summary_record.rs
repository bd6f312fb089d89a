//! Summary Record - cross-fold statistics for one metric group

use super::LabelScope;
use serde::{Deserialize, Serialize};

/// Mean and spread of one (estimator, scope, metric) group across folds.
///
/// Folds whose record is a failure or time-out sentinel are left out of the
/// statistics and counted in `excluded_fold_count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    estimator_id: String,
    scope: LabelScope,
    metric: String,
    mean: Option<f64>,
    std: Option<f64>,
    included_fold_count: usize,
    excluded_fold_count: usize,
}

impl SummaryRecord {
    /// Summarise the successful fold values of one group.
    ///
    /// Uses the sample standard deviation (n - 1); a single value has a
    /// deviation of 0. With no values, mean and std are `None`.
    #[must_use]
    pub fn from_values(
        estimator_id: impl Into<String>,
        scope: LabelScope,
        metric: impl Into<String>,
        values: &[f64],
        excluded_fold_count: usize,
    ) -> Self {
        let (mean, std) = mean_std(values).map_or((None, None), |(m, s)| (Some(m), Some(s)));
        Self {
            estimator_id: estimator_id.into(),
            scope,
            metric: metric.into(),
            mean,
            std,
            included_fold_count: values.len(),
            excluded_fold_count,
        }
    }

    /// Get the estimator identifier.
    #[must_use]
    pub fn estimator_id(&self) -> &str {
        &self.estimator_id
    }

    /// Get the label scope.
    #[must_use]
    pub const fn scope(&self) -> &LabelScope {
        &self.scope
    }

    /// Get the metric name.
    #[must_use]
    pub fn metric(&self) -> &str {
        &self.metric
    }

    /// Mean over included folds.
    #[must_use]
    pub const fn mean(&self) -> Option<f64> {
        self.mean
    }

    /// Sample standard deviation over included folds.
    #[must_use]
    pub const fn std(&self) -> Option<f64> {
        self.std
    }

    /// Folds that contributed a value.
    #[must_use]
    pub const fn included_fold_count(&self) -> usize {
        self.included_fold_count
    }

    /// Folds left out because they failed or timed out.
    #[must_use]
    pub const fn excluded_fold_count(&self) -> usize {
        self.excluded_fold_count
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std = if values.len() > 1 {
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        variance.sqrt()
    } else {
        0.0
    };
    Some((mean, std))
}
