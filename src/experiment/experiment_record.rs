//! Experiment Record - one cross-validation experiment over a dataset

use crate::dataset::DatasetCharacteristics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fold count and seed a split was drawn with.
///
/// Together with the dataset these reproduce the exact fold assignment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FoldProtocol {
    /// Number of folds
    pub k: usize,
    /// Seed of the stratified split
    pub seed: u64,
}

/// A tracked cross-validation experiment.
///
/// Runs refer back to it through `experiment_id`. The record names the
/// estimators under evaluation and the fold protocol, so a store can be
/// read back without the code that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExperimentRecord {
    experiment_id: String,
    name: String,
    created_at: DateTime<Utc>,
    protocol: Option<FoldProtocol>,
    #[serde(default)]
    estimators: Vec<String>,
    dataset: Option<DatasetCharacteristics>,
    config: Option<serde_json::Value>,
}

impl ExperimentRecord {
    /// Record with only an ID and a display name, stamped now.
    #[must_use]
    pub fn new(experiment_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::builder(experiment_id, name).build()
    }

    /// Start a record with optional protocol, estimators, dataset and config.
    #[must_use]
    pub fn builder(
        experiment_id: impl Into<String>,
        name: impl Into<String>,
    ) -> ExperimentRecordBuilder {
        ExperimentRecordBuilder {
            record: Self {
                experiment_id: experiment_id.into(),
                name: name.into(),
                created_at: Utc::now(),
                protocol: None,
                estimators: Vec::new(),
                dataset: None,
                config: None,
            },
        }
    }

    /// Experiment ID.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// When the experiment started.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Fold count and seed, if recorded.
    #[must_use]
    pub const fn protocol(&self) -> Option<FoldProtocol> {
        self.protocol
    }

    /// Identifiers of the evaluated estimator configurations, in run order.
    #[must_use]
    pub fn estimators(&self) -> &[String] {
        &self.estimators
    }

    /// Number of runs a complete experiment has: one per (estimator, fold).
    ///
    /// `None` without a recorded protocol.
    #[must_use]
    pub fn expected_runs(&self) -> Option<usize> {
        self.protocol.map(|p| p.k * self.estimators.len())
    }

    /// Dataset summary, if recorded.
    #[must_use]
    pub const fn dataset(&self) -> Option<&DatasetCharacteristics> {
        self.dataset.as_ref()
    }

    /// Free-form settings (runner options, estimator configs), if recorded.
    #[must_use]
    pub const fn config(&self) -> Option<&serde_json::Value> {
        self.config.as_ref()
    }
}

/// Builder for [`ExperimentRecord`].
#[derive(Debug)]
pub struct ExperimentRecordBuilder {
    record: ExperimentRecord,
}

impl ExperimentRecordBuilder {
    /// Set the fold protocol.
    #[must_use]
    pub const fn protocol(mut self, k: usize, seed: u64) -> Self {
        self.record.protocol = Some(FoldProtocol { k, seed });
        self
    }

    /// Set the estimator identifiers.
    #[must_use]
    pub fn estimators<I, S>(mut self, estimators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.record.estimators = estimators.into_iter().map(Into::into).collect();
        self
    }

    /// Set the dataset summary.
    #[must_use]
    pub fn dataset(mut self, dataset: DatasetCharacteristics) -> Self {
        self.record.dataset = Some(dataset);
        self
    }

    /// Set free-form settings.
    #[must_use]
    pub fn config(mut self, config: serde_json::Value) -> Self {
        self.record.config = Some(config);
        self
    }

    /// Override the creation time.
    #[must_use]
    pub const fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.record.created_at = created_at;
        self
    }

    /// Finish the record.
    #[must_use]
    pub fn build(self) -> ExperimentRecord {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_record() {
        let record = ExperimentRecord::new("cv-baselines", "Baseline problem transforms");
        assert_eq!(record.experiment_id(), "cv-baselines");
        assert_eq!(record.name(), "Baseline problem transforms");
        assert!(record.protocol().is_none());
        assert!(record.estimators().is_empty());
        assert_eq!(record.expected_runs(), None);
        assert!(record.dataset().is_none());
    }

    #[test]
    fn test_expected_runs_from_protocol() {
        let record = ExperimentRecord::builder("cv-1", "five folds")
            .protocol(5, 42)
            .estimators(["BinaryRelevance", "ClassifierChain", "LabelPowerset"])
            .build();

        assert_eq!(record.protocol(), Some(FoldProtocol { k: 5, seed: 42 }));
        assert_eq!(record.expected_runs(), Some(15));
    }

    #[test]
    fn test_estimators_default_when_absent_from_json() {
        let json = r#"{
            "experiment_id": "old",
            "name": "before estimators were recorded",
            "created_at": "2024-01-15T10:30:00Z",
            "protocol": null,
            "dataset": null,
            "config": null
        }"#;
        let record: ExperimentRecord = serde_json::from_str(json).unwrap();
        assert!(record.estimators().is_empty());
    }
}
