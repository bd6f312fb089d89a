//! Binary logistic regression trained by batch gradient descent

use super::{check_fit_shapes, BinaryClassifier, EstimatorConfig};
use crate::dataset::FeatureMatrix;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Hyperparameters of [`LogisticRegression`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegressionParams {
    /// Gradient descent iterations
    pub max_iter: usize,
    /// Step size
    pub learning_rate: f64,
    /// L2 penalty on the weights (not the intercept)
    pub l2: f64,
    /// Probability at or above which a sample is predicted positive
    pub threshold: f64,
}

impl Default for LogisticRegressionParams {
    fn default() -> Self {
        Self {
            max_iter: 100,
            learning_rate: 0.1,
            l2: 0.0,
            threshold: 0.5,
        }
    }
}

impl LogisticRegressionParams {
    /// Read hyperparameters from a config, falling back to defaults.
    ///
    /// `C` is accepted as inverse regularisation strength (`l2 = 1 / C`);
    /// unrecognised keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for values of the wrong type or out of range.
    pub fn from_config(config: &EstimatorConfig) -> Result<Self> {
        let defaults = Self::default();
        let max_iter = usize::try_from(config.unsigned("max_iter", defaults.max_iter as u64)?)
            .map_err(|_| Error::InvalidInput("max_iter does not fit in usize".to_string()))?;
        let learning_rate = config.float("learning_rate", defaults.learning_rate)?;
        let l2 = match config.hyperparameters.get("C") {
            Some(_) => {
                let c = config.float("C", 1.0)?;
                if c <= 0.0 {
                    return Err(Error::InvalidInput(format!("C must be positive, got {c}")));
                }
                1.0 / c
            }
            None => config.float("l2", defaults.l2)?,
        };
        let threshold = config.float("threshold", defaults.threshold)?;

        if !(learning_rate.is_finite() && learning_rate > 0.0) {
            return Err(Error::InvalidInput(format!(
                "learning_rate must be positive, got {learning_rate}"
            )));
        }
        if !(l2.is_finite() && l2 >= 0.0) {
            return Err(Error::InvalidInput(format!("l2 must be non-negative, got {l2}")));
        }
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::InvalidInput(format!(
                "threshold must lie in [0, 1], got {threshold}"
            )));
        }

        Ok(Self {
            max_iter,
            learning_rate,
            l2,
            threshold,
        })
    }
}

/// L2-regularised logistic regression.
#[derive(Debug, Clone, Default)]
pub struct LogisticRegression {
    params: LogisticRegressionParams,
    weights: Option<Vec<f64>>,
    intercept: f64,
}

impl LogisticRegression {
    /// Unfitted model with the given hyperparameters.
    #[must_use]
    pub const fn new(params: LogisticRegressionParams) -> Self {
        Self {
            params,
            weights: None,
            intercept: 0.0,
        }
    }

    /// Hyperparameters.
    #[must_use]
    pub const fn params(&self) -> &LogisticRegressionParams {
        &self.params
    }

    /// Fitted weights, one per feature.
    #[must_use]
    pub fn weights(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }

    /// Fitted intercept.
    #[must_use]
    pub const fn intercept(&self) -> f64 {
        self.intercept
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

impl BinaryClassifier for LogisticRegression {
    #[allow(clippy::cast_precision_loss)]
    fn fit(&mut self, features: &FeatureMatrix, targets: &[bool]) -> Result<()> {
        check_fit_shapes(features, targets.len())?;

        let n = features.n_rows() as f64;
        let mut weights = vec![0.0; features.n_cols()];
        let mut intercept = 0.0;
        let mut grad = vec![0.0; features.n_cols()];

        for _ in 0..self.params.max_iter {
            grad.iter_mut().for_each(|g| *g = 0.0);
            let mut grad_intercept = 0.0;

            for (row, &target) in features.rows().zip(targets) {
                let residual = sigmoid(dot(row, &weights) + intercept) - f64::from(u8::from(target));
                for (g, x) in grad.iter_mut().zip(row) {
                    *g += residual * x;
                }
                grad_intercept += residual;
            }

            for (w, g) in weights.iter_mut().zip(&grad) {
                *w -= self.params.learning_rate * (g / n + self.params.l2 * *w);
            }
            intercept -= self.params.learning_rate * grad_intercept / n;
        }

        if !(weights.iter().all(|w| w.is_finite()) && intercept.is_finite()) {
            return Err(Error::EstimatorFit(
                "logistic regression diverged; lower learning_rate".to_string(),
            ));
        }

        self.weights = Some(weights);
        self.intercept = intercept;
        Ok(())
    }

    fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<f64>> {
        let weights = self.weights.as_ref().ok_or_else(|| {
            Error::EstimatorFit("logistic regression used before fit".to_string())
        })?;
        if features.n_cols() != weights.len() {
            return Err(Error::EstimatorFit(format!(
                "fitted on {} features, got {}",
                weights.len(),
                features.n_cols()
            )));
        }
        Ok(features
            .rows()
            .map(|row| sigmoid(dot(row, weights) + self.intercept))
            .collect())
    }

    fn threshold(&self) -> f64 {
        self.params.threshold
    }

    fn fresh(&self) -> Box<dyn BinaryClassifier> {
        Box::new(Self::new(self.params))
    }
}
