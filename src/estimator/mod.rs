//! Estimators for multi-label genre classification
//!
//! Two seams:
//! - [`BinaryClassifier`]: a base learner for one yes/no label;
//! - [`MultiLabelEstimator`]: what cross-validation fits and scores.
//!
//! Problem transformations ([`BinaryRelevance`], [`ClassifierChain`],
//! [`LabelPowerset`]) turn a base learner into a multi-label estimator.
//! Estimators are described declaratively by [`EstimatorConfig`] and built by
//! an [`EstimatorRegistry`], one fresh instance per fold.
//!
//! ## Example
//!
//! ```rust
//! use genre_cv::estimator::{EstimatorConfig, EstimatorRegistry};
//!
//! let config: EstimatorConfig = serde_json::from_str(r#"{
//!     "model_type": "skmultilearn.problem_transform.ClassifierChain",
//!     "base_model": {
//!         "model_type": "sklearn.linear_model.LogisticRegression",
//!         "hyperparameters": { "max_iter": 1000 }
//!     }
//! }"#).unwrap();
//!
//! assert_eq!(config.identifier(), "ClassifierChain");
//! let estimator = EstimatorRegistry::with_defaults().build(&config).unwrap();
//! assert_eq!(estimator.kind(), "ClassifierChain");
//! ```

mod logistic;
mod prior;
mod registry;
mod transform;

pub use logistic::{LogisticRegression, LogisticRegressionParams};
pub use prior::MajorityPrior;
pub use registry::{BinaryFactory, EstimatorRegistry, MultiLabelFactory};
pub use transform::{BinaryRelevance, ClassifierChain, LabelPowerset};

use crate::dataset::{FeatureMatrix, LabelMatrix};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// A classifier for a single binary label.
pub trait BinaryClassifier: Send + fmt::Debug {
    /// Fit on features and targets.
    ///
    /// # Errors
    ///
    /// Returns `EstimatorFit` on shape mismatches or unusable data.
    fn fit(&mut self, features: &FeatureMatrix, targets: &[bool]) -> Result<()>;

    /// Probability of the positive class for each row.
    ///
    /// # Errors
    ///
    /// Returns `EstimatorFit` if called before `fit` or on a shape mismatch.
    fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<f64>>;

    /// Decision threshold applied by [`BinaryClassifier::predict`].
    fn threshold(&self) -> f64 {
        0.5
    }

    /// Hard predictions at [`BinaryClassifier::threshold`].
    ///
    /// # Errors
    ///
    /// Same as [`BinaryClassifier::predict_proba`].
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<bool>> {
        let threshold = self.threshold();
        Ok(self
            .predict_proba(features)?
            .into_iter()
            .map(|p| p >= threshold)
            .collect())
    }

    /// An unfitted copy with the same hyperparameters.
    fn fresh(&self) -> Box<dyn BinaryClassifier>;
}

/// An estimator over the whole label vocabulary.
pub trait MultiLabelEstimator: Send + fmt::Debug {
    /// Short name of the estimator type.
    fn kind(&self) -> &'static str;

    /// Fit on features and multi-hot labels.
    ///
    /// # Errors
    ///
    /// Returns `EstimatorFit` on shape mismatches or unusable data.
    fn fit(&mut self, features: &FeatureMatrix, labels: &LabelMatrix) -> Result<()>;

    /// Predict multi-hot labels.
    ///
    /// # Errors
    ///
    /// Returns `EstimatorFit` if called before `fit` or on a shape mismatch.
    fn predict(&self, features: &FeatureMatrix) -> Result<LabelMatrix>;
}

/// Declarative estimator description.
///
/// Mirrors the configuration dictionaries of the research notebooks: a
/// dotted `model_type`, free-form `hyperparameters`, and for problem
/// transformations a nested `base_model`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatorConfig {
    /// Dotted model type; only the last segment selects the factory
    pub model_type: String,
    /// Optional display name, used as the estimator identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Hyperparameters passed to the factory
    #[serde(default)]
    pub hyperparameters: serde_json::Map<String, serde_json::Value>,
    /// Base learner for problem transformations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_model: Option<Box<EstimatorConfig>>,
}

impl EstimatorConfig {
    /// Config for `model_type` with no hyperparameters.
    #[must_use]
    pub fn new(model_type: impl Into<String>) -> Self {
        Self {
            model_type: model_type.into(),
            name: None,
            hyperparameters: serde_json::Map::new(),
            base_model: None,
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add a hyperparameter.
    #[must_use]
    pub fn with_hyperparameter(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.hyperparameters.insert(key.into(), value.into());
        self
    }

    /// Set the base learner.
    #[must_use]
    pub fn with_base_model(mut self, base: Self) -> Self {
        self.base_model = Some(Box::new(base));
        self
    }

    /// Last `.`-separated segment of `model_type`.
    #[must_use]
    pub fn short_type(&self) -> &str {
        self.model_type
            .rsplit('.')
            .next()
            .unwrap_or(&self.model_type)
    }

    /// Identifier used in metric records: `name`, or the short model type.
    #[must_use]
    pub fn identifier(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.short_type())
    }

    /// Load a JSON array of configs.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, `Json` if it does not parse.
    pub fn load_all<P: AsRef<Path>>(path: P) -> Result<Vec<Self>> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub(crate) fn float(&self, key: &str, default: f64) -> Result<f64> {
        match self.hyperparameters.get(key) {
            None => Ok(default),
            Some(value) => value.as_f64().ok_or_else(|| {
                Error::InvalidInput(format!(
                    "{}: hyperparameter '{key}' must be a number, got {value}",
                    self.short_type()
                ))
            }),
        }
    }

    pub(crate) fn unsigned(&self, key: &str, default: u64) -> Result<u64> {
        match self.hyperparameters.get(key) {
            None => Ok(default),
            Some(value) => value.as_u64().ok_or_else(|| {
                Error::InvalidInput(format!(
                    "{}: hyperparameter '{key}' must be a non-negative integer, got {value}",
                    self.short_type()
                ))
            }),
        }
    }
}

/// Check that a fit call's inputs line up.
pub(crate) fn check_fit_shapes(features: &FeatureMatrix, n_targets: usize) -> Result<()> {
    if features.n_rows() != n_targets {
        return Err(Error::EstimatorFit(format!(
            "{} feature rows but {n_targets} targets",
            features.n_rows()
        )));
    }
    if features.n_rows() == 0 {
        return Err(Error::EstimatorFit("cannot fit on zero samples".to_string()));
    }
    if !features.is_finite() {
        return Err(Error::EstimatorFit(
            "features contain NaN or infinite values".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_prefers_name() {
        let config = EstimatorConfig::new("skmultilearn.problem_transform.LabelPowerset");
        assert_eq!(config.identifier(), "LabelPowerset");
        assert_eq!(config.with_name("lp-1000").identifier(), "lp-1000");
    }

    #[test]
    fn test_hyperparameter_types_checked() {
        let config = EstimatorConfig::new("LogisticRegression")
            .with_hyperparameter("max_iter", "many")
            .with_hyperparameter("learning_rate", 0.5);
        assert!(config.unsigned("max_iter", 100).is_err());
        assert!((config.float("learning_rate", 0.1).unwrap() - 0.5).abs() < f64::EPSILON);
        assert!((config.float("l2", 0.0).unwrap()).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_json_roundtrip_keeps_nesting() {
        let config = EstimatorConfig::new("BinaryRelevance")
            .with_base_model(EstimatorConfig::new("LogisticRegression").with_hyperparameter("max_iter", 50));
        let json = serde_json::to_string(&config).unwrap();
        let parsed: EstimatorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
