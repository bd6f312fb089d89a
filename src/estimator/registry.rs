//! Model-type registry turning [`EstimatorConfig`]s into estimators

use super::{
    BinaryClassifier, BinaryRelevance, ClassifierChain, EstimatorConfig, LabelPowerset,
    LogisticRegression, LogisticRegressionParams, MajorityPrior, MultiLabelEstimator,
};
use crate::{Error, Result};
use std::collections::HashMap;
use std::fmt;

/// Builds a multi-label estimator from its config and the registry (for
/// resolving a `base_model`).
pub type MultiLabelFactory = Box<
    dyn Fn(&EstimatorConfig, &EstimatorRegistry) -> Result<Box<dyn MultiLabelEstimator>>
        + Send
        + Sync,
>;

/// Builds a binary base learner from its config.
pub type BinaryFactory =
    Box<dyn Fn(&EstimatorConfig) -> Result<Box<dyn BinaryClassifier>> + Send + Sync>;

/// Maps model types (the last `.` segment of `model_type`) to factories.
///
/// A binary learner named at the top level is wrapped in
/// [`BinaryRelevance`]; a problem transformation without a `base_model` gets
/// a default [`LogisticRegression`].
pub struct EstimatorRegistry {
    multi: HashMap<String, MultiLabelFactory>,
    binary: HashMap<String, BinaryFactory>,
}

impl fmt::Debug for EstimatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut multi: Vec<&String> = self.multi.keys().collect();
        let mut binary: Vec<&String> = self.binary.keys().collect();
        multi.sort();
        binary.sort();
        f.debug_struct("EstimatorRegistry")
            .field("multi", &multi)
            .field("binary", &binary)
            .finish()
    }
}

impl Default for EstimatorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl EstimatorRegistry {
    /// Registry with no model types.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            multi: HashMap::new(),
            binary: HashMap::new(),
        }
    }

    /// Registry with the built-in estimators.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register_binary("LogisticRegression", |config| {
            Ok(Box::new(LogisticRegression::new(
                LogisticRegressionParams::from_config(config)?,
            )))
        });
        registry.register("BinaryRelevance", |config, registry| {
            Ok(Box::new(BinaryRelevance::new(registry.base_model(config)?)))
        });
        registry.register("ClassifierChain", |config, registry| {
            Ok(Box::new(ClassifierChain::new(registry.base_model(config)?)))
        });
        registry.register("LabelPowerset", |config, registry| {
            Ok(Box::new(LabelPowerset::new(registry.base_model(config)?)))
        });
        registry.register("MajorityPrior", |_, _| Ok(Box::new(MajorityPrior::new())));
        registry
    }

    /// Register a multi-label model type, replacing any previous factory.
    pub fn register<F>(&mut self, model_type: impl Into<String>, factory: F)
    where
        F: Fn(&EstimatorConfig, &Self) -> Result<Box<dyn MultiLabelEstimator>>
            + Send
            + Sync
            + 'static,
    {
        self.multi.insert(model_type.into(), Box::new(factory));
    }

    /// Register a binary base learner type, replacing any previous factory.
    pub fn register_binary<F>(&mut self, model_type: impl Into<String>, factory: F)
    where
        F: Fn(&EstimatorConfig) -> Result<Box<dyn BinaryClassifier>> + Send + Sync + 'static,
    {
        self.binary.insert(model_type.into(), Box::new(factory));
    }

    /// True if `model_type` resolves to a factory.
    #[must_use]
    pub fn contains(&self, model_type: &str) -> bool {
        let key = short(model_type);
        self.multi.contains_key(key) || self.binary.contains_key(key)
    }

    /// Build a fresh, unfitted estimator.
    ///
    /// # Errors
    ///
    /// Returns `UnknownModelType` if neither the config's model type nor its
    /// base model's is registered, or the factory's own error.
    pub fn build(&self, config: &EstimatorConfig) -> Result<Box<dyn MultiLabelEstimator>> {
        let key = config.short_type();
        if let Some(factory) = self.multi.get(key) {
            return factory(config, self);
        }
        if self.binary.contains_key(key) {
            return Ok(Box::new(BinaryRelevance::new(self.build_binary(config)?)));
        }
        Err(Error::UnknownModelType(config.model_type.clone()))
    }

    /// Build a fresh binary base learner.
    ///
    /// # Errors
    ///
    /// Returns `UnknownModelType` if the model type is not a registered
    /// binary learner.
    pub fn build_binary(&self, config: &EstimatorConfig) -> Result<Box<dyn BinaryClassifier>> {
        self.binary
            .get(config.short_type())
            .ok_or_else(|| Error::UnknownModelType(config.model_type.clone()))
            .and_then(|factory| factory(config))
    }

    /// Base learner of a problem transformation, defaulting to logistic regression.
    ///
    /// # Errors
    ///
    /// Same as [`EstimatorRegistry::build_binary`].
    pub fn base_model(&self, config: &EstimatorConfig) -> Result<Box<dyn BinaryClassifier>> {
        match &config.base_model {
            Some(base) => self.build_binary(base),
            None => self.build_binary(&EstimatorConfig::new("LogisticRegression")),
        }
    }
}

fn short(model_type: &str) -> &str {
    model_type.rsplit('.').next().unwrap_or(model_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_dotted_names() {
        let registry = EstimatorRegistry::with_defaults();
        for model_type in [
            "skmultilearn.problem_transform.BinaryRelevance",
            "skmultilearn.problem_transform.ClassifierChain",
            "skmultilearn.problem_transform.LabelPowerset",
            "sklearn.linear_model.LogisticRegression",
            "MajorityPrior",
        ] {
            assert!(registry.contains(model_type), "{model_type}");
            assert!(registry.build(&EstimatorConfig::new(model_type)).is_ok());
        }
    }

    #[test]
    fn test_binary_learner_at_top_level_is_wrapped() {
        let registry = EstimatorRegistry::with_defaults();
        let estimator = registry
            .build(&EstimatorConfig::new("LogisticRegression"))
            .unwrap();
        assert_eq!(estimator.kind(), "BinaryRelevance");
    }

    #[test]
    fn test_unknown_model_type() {
        let registry = EstimatorRegistry::with_defaults();
        let err = registry
            .build(&EstimatorConfig::new("sklearn.svm.SVC"))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownModelType(ref t) if t == "sklearn.svm.SVC"));

        let err = registry
            .build(&EstimatorConfig::new("LabelPowerset").with_base_model(EstimatorConfig::new("SVC")))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownModelType(_)));
    }

    #[test]
    fn test_register_custom_factory() {
        let mut registry = EstimatorRegistry::empty();
        assert!(!registry.contains("MajorityPrior"));
        registry.register("Constant", |_, _| Ok(Box::new(MajorityPrior::new())));
        let estimator = registry.build(&EstimatorConfig::new("my.Constant")).unwrap();
        assert_eq!(estimator.kind(), "MajorityPrior");
    }
}
