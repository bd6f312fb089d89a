//! Experiment Store - in-memory storage for experiment tracking data
//!
//! Implements [`ExperimentTracker`] so a cross-validation run can log into it
//! directly, and persists to / restores from a JSON file.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{
    ExperimentRecord, ExperimentTracker, LabelScope, MetricRecord, RunRecord, SummaryRecord,
};
use crate::Result;

/// In-memory store for experiment tracking data.
///
/// ## Design
///
/// Experiments and runs are keyed by ID for O(1) lookups. Metric records are
/// kept per run ID and summaries per experiment ID, so several experiments
/// can share one store without mixing their folds.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ExperimentStore {
    experiments: HashMap<String, ExperimentRecord>,
    runs: HashMap<String, RunRecord>,
    metrics: HashMap<String, Vec<MetricRecord>>,
    summaries: HashMap<String, Vec<SummaryRecord>>,
}

impl ExperimentStore {
    /// Create a new empty experiment store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the store is empty (no experiments, runs, metrics or summaries).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty()
            && self.runs.is_empty()
            && self.metrics.is_empty()
            && self.summaries.is_empty()
    }

    /// Get the number of experiments in the store.
    #[must_use]
    pub fn experiment_count(&self) -> usize {
        self.experiments.len()
    }

    /// Get the number of runs in the store.
    #[must_use]
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Get the number of metric records across all runs.
    #[must_use]
    pub fn metric_count(&self) -> usize {
        self.metrics.values().map(Vec::len).sum()
    }

    /// Add an experiment to the store.
    pub fn add_experiment(&mut self, experiment: ExperimentRecord) {
        self.experiments
            .insert(experiment.experiment_id().to_string(), experiment);
    }

    /// Get an experiment by ID.
    #[must_use]
    pub fn get_experiment(&self, experiment_id: &str) -> Option<&ExperimentRecord> {
        self.experiments.get(experiment_id)
    }

    /// Add a run to the store, replacing any run with the same ID.
    pub fn add_run(&mut self, run: RunRecord) {
        self.runs.insert(run.run_id().to_string(), run);
    }

    /// Get a run by ID.
    #[must_use]
    pub fn get_run(&self, run_id: &str) -> Option<&RunRecord> {
        self.runs.get(run_id)
    }

    /// Get all runs for an experiment, ordered by estimator then fold.
    #[must_use]
    pub fn get_runs_for_experiment(&self, experiment_id: &str) -> Vec<&RunRecord> {
        let mut runs: Vec<&RunRecord> = self
            .runs
            .values()
            .filter(|run| run.experiment_id() == experiment_id)
            .collect();
        runs.sort_by(|a, b| {
            a.estimator_id()
                .cmp(b.estimator_id())
                .then(a.fold().cmp(&b.fold()))
        });
        runs
    }

    /// Append a metric record to a run.
    pub fn add_metric(&mut self, run_id: &str, metric: MetricRecord) {
        self.metrics.entry(run_id.to_string()).or_default().push(metric);
    }

    /// Metric records of one run, in insertion order.
    #[must_use]
    pub fn metrics_for_run(&self, run_id: &str) -> &[MetricRecord] {
        self.metrics.get(run_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Get the records of one metric group within an experiment, ordered by fold.
    ///
    /// Only metrics attached to runs of `experiment_id` are considered.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use genre_cv::experiment::{ExperimentStore, LabelScope, MetricRecord, RunRecord};
    ///
    /// let mut store = ExperimentStore::new();
    /// for fold in (0..5).rev() {
    ///     let run = RunRecord::new("exp-1", "BinaryRelevance", fold);
    ///     store.add_metric(
    ///         run.run_id(),
    ///         MetricRecord::value("BinaryRelevance", fold, LabelScope::label("rock"), "f1", 0.8),
    ///     );
    ///     store.add_run(run);
    /// }
    ///
    /// let f1 = store.get_metrics("exp-1", "BinaryRelevance", &LabelScope::label("rock"), "f1");
    /// assert_eq!(f1.len(), 5);
    /// assert_eq!(f1[0].fold(), 0);
    /// assert!(store.get_metrics("exp-2", "BinaryRelevance", &LabelScope::label("rock"), "f1").is_empty());
    /// ```
    #[must_use]
    pub fn get_metrics(
        &self,
        experiment_id: &str,
        estimator_id: &str,
        scope: &LabelScope,
        metric: &str,
    ) -> Vec<MetricRecord> {
        let mut metrics: Vec<MetricRecord> = self
            .runs
            .values()
            .filter(|run| run.experiment_id() == experiment_id && run.estimator_id() == estimator_id)
            .flat_map(|run| self.metrics_for_run(run.run_id()))
            .filter(|m| m.estimator_id() == estimator_id && m.scope() == scope && m.metric() == metric)
            .cloned()
            .collect();

        metrics.sort_by_key(MetricRecord::fold);

        metrics
    }

    /// Add aggregated summaries of an experiment.
    pub fn add_summaries(
        &mut self,
        experiment_id: &str,
        summaries: impl IntoIterator<Item = SummaryRecord>,
    ) {
        self.summaries
            .entry(experiment_id.to_string())
            .or_default()
            .extend(summaries);
    }

    /// Summaries of one experiment, in insertion order.
    #[must_use]
    pub fn summaries(&self, experiment_id: &str) -> &[SummaryRecord] {
        self.summaries.get(experiment_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Persist the store as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be created, `Json` if encoding fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let writer = BufWriter::new(File::create(path.as_ref())?);
        serde_json::to_writer_pretty(writer, self)?;
        tracing::info!(
            path = %path.as_ref().display(),
            runs = self.runs.len(),
            metrics = self.metric_count(),
            "saved experiment store"
        );
        Ok(())
    }

    /// Restore a store saved with [`ExperimentStore::save`].
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be opened, `Json` if decoding fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        Ok(serde_json::from_reader(reader)?)
    }
}

impl ExperimentTracker for ExperimentStore {
    fn log_experiment(&mut self, experiment: &ExperimentRecord) -> Result<()> {
        self.add_experiment(experiment.clone());
        Ok(())
    }

    fn log_run(&mut self, run: &RunRecord, metrics: &[MetricRecord]) -> Result<()> {
        self.metrics.insert(run.run_id().to_string(), metrics.to_vec());
        self.add_run(run.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::{Outcome, RunStatus};

    #[test]
    fn test_store_default() {
        let store = ExperimentStore::new();
        assert!(store.is_empty());
        assert_eq!(store.experiment_count(), 0);
        assert_eq!(store.run_count(), 0);
        assert_eq!(store.metric_count(), 0);
    }

    #[test]
    fn test_tracker_logs_run_and_metrics() {
        let mut store = ExperimentStore::new();
        let mut run = RunRecord::new("exp-1", "BinaryRelevance", 0);
        run.start();
        run.complete(RunStatus::Success);
        let metrics = vec![
            MetricRecord::value("BinaryRelevance", 0, LabelScope::Overall, "hamming_loss", 0.1),
            MetricRecord::value("BinaryRelevance", 0, LabelScope::Overall, "f1_micro_avg", 0.7),
        ];

        store.log_run(&run, &metrics).unwrap();

        assert_eq!(store.run_count(), 1);
        assert_eq!(store.metric_count(), 2);
        assert!(store.get_run("exp-1/BinaryRelevance/fold-0").is_some());
        assert_eq!(store.metrics_for_run("exp-1/BinaryRelevance/fold-0").len(), 2);
    }

    #[test]
    fn test_get_metrics_ordering() {
        let mut store = ExperimentStore::new();
        for fold in [2, 0, 1] {
            let run = RunRecord::new("exp-1", "LabelPowerset", fold);
            store.add_metric(
                run.run_id(),
                MetricRecord::new(
                    "LabelPowerset",
                    fold,
                    LabelScope::Overall,
                    "f1_macro_avg",
                    Outcome::TimedOut,
                ),
            );
            store.add_run(run);
        }

        let metrics =
            store.get_metrics("exp-1", "LabelPowerset", &LabelScope::Overall, "f1_macro_avg");

        assert_eq!(metrics.len(), 3);
        assert_eq!(metrics[0].fold(), 0);
        assert_eq!(metrics[1].fold(), 1);
        assert_eq!(metrics[2].fold(), 2);
    }

    #[test]
    fn test_runs_for_experiment_sorted() {
        let mut store = ExperimentStore::new();
        store.add_run(RunRecord::new("exp-1", "b", 1));
        store.add_run(RunRecord::new("exp-1", "a", 1));
        store.add_run(RunRecord::new("exp-1", "a", 0));
        store.add_run(RunRecord::new("exp-2", "a", 0));

        let runs = store.get_runs_for_experiment("exp-1");
        let ids: Vec<&str> = runs.iter().map(|r| r.run_id()).collect();
        assert_eq!(ids, vec!["exp-1/a/fold-0", "exp-1/a/fold-1", "exp-1/b/fold-1"]);
        assert!(store.get_run("exp-2/a/fold-0").is_some());
    }

    #[test]
    fn test_experiments_sharing_an_estimator_stay_apart() {
        let mut store = ExperimentStore::new();
        for (experiment, value) in [("exp-a", 0.25), ("exp-b", 0.75)] {
            let mut run = RunRecord::new(experiment, "MajorityPrior", 0);
            run.complete(RunStatus::Success);
            let metric = MetricRecord::value("MajorityPrior", 0, LabelScope::Overall, "f1_micro_avg", value);
            store.log_run(&run, &[metric]).unwrap();
        }

        assert_eq!(store.run_count(), 2);
        assert_eq!(store.metric_count(), 2);
        for (experiment, value) in [("exp-a", 0.25), ("exp-b", 0.75)] {
            let metrics =
                store.get_metrics(experiment, "MajorityPrior", &LabelScope::Overall, "f1_micro_avg");
            assert_eq!(metrics.len(), 1);
            assert_eq!(metrics[0].metric_value(), Some(value));
        }
    }
}
