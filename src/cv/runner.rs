//! Cross-validation runner with per-fold failure isolation

use crate::dataset::{validate_folds, Dataset, FoldAssignment};
use crate::estimator::{EstimatorConfig, EstimatorRegistry, MultiLabelEstimator};
use crate::experiment::{
    ExperimentRecord, ExperimentTracker, LabelScope, MetricRecord, Outcome, RunRecord, RunStatus,
    SummaryRecord,
};
use crate::metrics::{metric_schema, MultiLabelMetrics};
use crate::scaling::{Scaling, StandardScaler};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::{Duration, Instant};

use super::MetricsAggregator;

/// Runner settings.
///
/// ## Example
///
/// ```rust
/// use genre_cv::cv::RunnerConfig;
/// use genre_cv::scaling::Scaling;
/// use std::time::Duration;
///
/// let config = RunnerConfig::builder()
///     .experiment_id("baselines")
///     .scaling(Scaling::All)
///     .time_budget(Duration::from_secs(600))
///     .build();
/// assert_eq!(config.time_budget(), Some(Duration::from_secs(600)));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    experiment_id: String,
    scaling: Scaling,
    time_budget_secs: Option<f64>,
    parallel: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            experiment_id: "cv".to_string(),
            scaling: Scaling::None,
            time_budget_secs: None,
            parallel: true,
        }
    }
}

impl RunnerConfig {
    /// Builder starting from the defaults.
    #[must_use]
    pub fn builder() -> RunnerConfigBuilder {
        RunnerConfigBuilder::default()
    }

    /// Load from a JSON file; absent fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `Io` or `Json` on read or parse failures, `InvalidInput` for a
    /// negative or non-finite time budget.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        if let Some(secs) = config.time_budget_secs {
            Duration::try_from_secs_f64(secs).map_err(|_| {
                Error::InvalidInput(format!("time_budget_secs must be non-negative, got {secs}"))
            })?;
        }
        Ok(config)
    }

    /// Identifier given to the tracked experiment and its runs.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Per-fold feature standardisation.
    #[must_use]
    pub const fn scaling(&self) -> &Scaling {
        &self.scaling
    }

    /// Wall-clock budget per estimator configuration.
    #[must_use]
    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_secs
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }

    /// Whether folds run on the rayon pool (needs the `parallel` feature).
    #[must_use]
    pub const fn parallel(&self) -> bool {
        self.parallel
    }
}

/// Builder for [`RunnerConfig`].
#[derive(Debug, Default)]
pub struct RunnerConfigBuilder {
    config: RunnerConfig,
}

impl RunnerConfigBuilder {
    /// Set the experiment identifier.
    #[must_use]
    pub fn experiment_id(mut self, experiment_id: impl Into<String>) -> Self {
        self.config.experiment_id = experiment_id.into();
        self
    }

    /// Set per-fold feature standardisation.
    #[must_use]
    pub fn scaling(mut self, scaling: Scaling) -> Self {
        self.config.scaling = scaling;
        self
    }

    /// Set the per-configuration time budget.
    #[must_use]
    pub fn time_budget(mut self, budget: Duration) -> Self {
        self.config.time_budget_secs = Some(budget.as_secs_f64());
        self
    }

    /// Run folds sequentially or on the rayon pool.
    #[must_use]
    pub const fn parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    /// Build the config.
    #[must_use]
    pub fn build(self) -> RunnerConfig {
        self.config
    }
}

/// An estimator fitted on one fold's training partition.
#[derive(Debug)]
pub struct FittedModel {
    estimator_id: String,
    fold: usize,
    estimator: Box<dyn MultiLabelEstimator>,
}

impl FittedModel {
    /// Identifier of the estimator configuration.
    #[must_use]
    pub fn estimator_id(&self) -> &str {
        &self.estimator_id
    }

    /// Fold the model was trained for.
    #[must_use]
    pub const fn fold(&self) -> usize {
        self.fold
    }

    /// The fitted estimator.
    #[must_use]
    pub fn estimator(&self) -> &dyn MultiLabelEstimator {
        self.estimator.as_ref()
    }

    /// Take ownership of the fitted estimator.
    #[must_use]
    pub fn into_estimator(self) -> Box<dyn MultiLabelEstimator> {
        self.estimator
    }
}

/// Everything a cross-validation run produced.
#[derive(Debug)]
pub struct CrossValidationRun {
    records: Vec<MetricRecord>,
    runs: Vec<RunRecord>,
    folds: Vec<FoldAssignment>,
    models: Vec<FittedModel>,
}

impl CrossValidationRun {
    /// Metric records, ordered by configuration, fold, then schema order.
    #[must_use]
    pub fn records(&self) -> &[MetricRecord] {
        &self.records
    }

    /// One run record per (estimator, fold).
    #[must_use]
    pub fn runs(&self) -> &[RunRecord] {
        &self.runs
    }

    /// Fold assignments used by every configuration.
    #[must_use]
    pub fn folds(&self) -> &[FoldAssignment] {
        &self.folds
    }

    /// Fitted estimators of the successful runs.
    #[must_use]
    pub fn models(&self) -> &[FittedModel] {
        &self.models
    }

    /// Fitted estimator for one (estimator, fold), if that run succeeded.
    #[must_use]
    pub fn model(&self, estimator_id: &str, fold: usize) -> Option<&dyn MultiLabelEstimator> {
        self.models
            .iter()
            .find(|m| m.estimator_id == estimator_id && m.fold == fold)
            .map(FittedModel::estimator)
    }

    /// Runs that ended in failure or time-out.
    pub fn unsuccessful_runs(&self) -> impl Iterator<Item = &RunRecord> {
        self.runs
            .iter()
            .filter(|run| run.status() != RunStatus::Success)
    }

    /// Aggregate the records across folds.
    ///
    /// # Errors
    ///
    /// Returns `EmptyInput` if the run produced no records.
    pub fn summarize(&self) -> Result<Vec<SummaryRecord>> {
        MetricsAggregator::aggregate(&self.records)
    }

    /// Take the metric records.
    #[must_use]
    pub fn into_records(self) -> Vec<MetricRecord> {
        self.records
    }
}

/// Result of one (estimator, fold) unit.
struct FoldOutcome {
    run: RunRecord,
    records: Vec<MetricRecord>,
    model: Option<Box<dyn MultiLabelEstimator>>,
}

/// Evaluates estimator configurations over stratified folds.
///
/// Estimator construction, fitting and prediction failures are recorded as
/// sentinel outcomes for the affected fold; only structural problems (bad
/// fold counts, rare labels, invalid scaling columns, bad configurations)
/// abort a run.
///
/// ## Example
///
/// ```rust
/// use genre_cv::cv::{CrossValidationRunner, MetricsAggregator, RunnerConfig};
/// use genre_cv::dataset::{Dataset, FeatureMatrix, LabelMatrix};
/// use genre_cv::estimator::EstimatorConfig;
///
/// # fn main() -> genre_cv::Result<()> {
/// let rows: Vec<Vec<f64>> = (0..12).map(|i| vec![f64::from(i)]).collect();
/// let labels: Vec<Vec<bool>> = (0..12).map(|i| vec![i < 6, i % 3 == 0]).collect();
/// let dataset = Dataset::new(
///     (0..12).map(|i| format!("t{i}")).collect(),
///     vec!["tempo".into()],
///     vec!["rock".into(), "jazz".into()],
///     FeatureMatrix::from_rows(&rows)?,
///     LabelMatrix::from_rows(&labels)?,
/// )?;
///
/// let runner = CrossValidationRunner::new(RunnerConfig::default());
/// let run = runner.run(&dataset, &[EstimatorConfig::new("MajorityPrior")], 3, 7)?;
/// assert_eq!(run.runs().len(), 3);
///
/// let summaries = MetricsAggregator::aggregate(run.records())?;
/// assert!(summaries.iter().all(|s| s.excluded_fold_count() == 0));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct CrossValidationRunner {
    config: RunnerConfig,
    registry: EstimatorRegistry,
}

impl CrossValidationRunner {
    /// Runner with the built-in estimator registry.
    #[must_use]
    pub fn new(config: RunnerConfig) -> Self {
        Self::with_registry(config, EstimatorRegistry::with_defaults())
    }

    /// Runner with a caller-supplied registry.
    #[must_use]
    pub const fn with_registry(config: RunnerConfig, registry: EstimatorRegistry) -> Self {
        Self { config, registry }
    }

    /// Runner settings.
    #[must_use]
    pub const fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Estimator registry.
    #[must_use]
    pub const fn registry(&self) -> &EstimatorRegistry {
        &self.registry
    }

    /// Evaluate every configuration on `k` stratified folds.
    ///
    /// # Errors
    ///
    /// - `EmptyInput` if `configs` is empty
    /// - `InvalidInput` on duplicate estimator identifiers or a bad `k`
    /// - `MissingColumns` if the scaling names unknown feature columns
    /// - `InsufficientSamples` if a label occurs fewer than `k` times
    /// - `InvalidFold` if a fold leaks or drops samples
    pub fn run(
        &self,
        dataset: &Dataset,
        configs: &[EstimatorConfig],
        k: usize,
        seed: u64,
    ) -> Result<CrossValidationRun> {
        self.execute(dataset, configs, k, seed, None)
    }

    /// Same as [`CrossValidationRunner::run`], also reporting the experiment
    /// and each finished run to `tracker`. Tracker errors are logged and the
    /// run continues.
    ///
    /// # Errors
    ///
    /// Same as [`CrossValidationRunner::run`].
    pub fn run_tracked(
        &self,
        dataset: &Dataset,
        configs: &[EstimatorConfig],
        k: usize,
        seed: u64,
        tracker: &mut dyn ExperimentTracker,
    ) -> Result<CrossValidationRun> {
        self.execute(dataset, configs, k, seed, Some(tracker))
    }

    fn execute(
        &self,
        dataset: &Dataset,
        configs: &[EstimatorConfig],
        k: usize,
        seed: u64,
        mut tracker: Option<&mut dyn ExperimentTracker>,
    ) -> Result<CrossValidationRun> {
        check_configs(configs)?;
        let scaled_columns = self.config.scaling.resolve(dataset.feature_names())?;
        let folds = dataset.split(k, seed)?;
        validate_folds(&folds, dataset.n_samples())?;

        tracing::info!(
            experiment = %self.config.experiment_id,
            samples = dataset.n_samples(),
            labels = dataset.label_names().len(),
            configurations = configs.len(),
            k,
            seed,
            "starting cross-validation"
        );

        if let Some(tracker) = tracker.as_deref_mut() {
            let experiment = ExperimentRecord::builder(
                self.config.experiment_id.clone(),
                format!("{k}-fold cross-validation"),
            )
            .protocol(k, seed)
            .estimators(configs.iter().map(EstimatorConfig::identifier))
            .config(serde_json::json!({
                "runner": self.config,
                "estimators": configs,
            }))
            .dataset(dataset.characteristics())
            .build();
            if let Err(err) = tracker.log_experiment(&experiment) {
                tracing::warn!(error = %err, "experiment tracker rejected experiment record");
            }
        }

        let schema = metric_schema(dataset.label_names());
        let mut records = Vec::with_capacity(configs.len() * folds.len() * schema.len());
        let mut runs = Vec::with_capacity(configs.len() * folds.len());
        let mut models = Vec::new();

        for config in configs {
            let estimator_id = config.identifier();
            tracing::info!(estimator = estimator_id, model_type = %config.model_type, "evaluating configuration");

            let unit = FoldUnit {
                runner: self,
                dataset,
                config,
                scaled_columns: scaled_columns.as_deref(),
                schema: &schema,
                deadline: self.config.time_budget().map(|budget| Instant::now() + budget),
            };
            let outcomes = self.map_folds(&folds, |fold| unit.evaluate(fold));

            let mut failures = 0;
            for outcome in outcomes {
                if outcome.run.status() != RunStatus::Success {
                    failures += 1;
                }
                if let Some(tracker) = tracker.as_deref_mut() {
                    if let Err(err) = tracker.log_run(&outcome.run, &outcome.records) {
                        tracing::warn!(run = outcome.run.run_id(), error = %err, "experiment tracker rejected run");
                    }
                }
                if let Some(estimator) = outcome.model {
                    models.push(FittedModel {
                        estimator_id: estimator_id.to_string(),
                        fold: outcome.run.fold(),
                        estimator,
                    });
                }
                records.extend(outcome.records);
                runs.push(outcome.run);
            }
            tracing::info!(estimator = estimator_id, failures, "configuration finished");
        }

        Ok(CrossValidationRun {
            records,
            runs,
            folds,
            models,
        })
    }

    #[cfg(feature = "parallel")]
    fn map_folds<F>(&self, folds: &[FoldAssignment], evaluate: F) -> Vec<FoldOutcome>
    where
        F: Fn(&FoldAssignment) -> FoldOutcome + Send + Sync,
    {
        if self.config.parallel {
            use rayon::prelude::*;
            return folds.par_iter().map(evaluate).collect();
        }
        folds.iter().map(evaluate).collect()
    }

    #[cfg(not(feature = "parallel"))]
    #[allow(clippy::unused_self)]
    fn map_folds<F>(&self, folds: &[FoldAssignment], evaluate: F) -> Vec<FoldOutcome>
    where
        F: Fn(&FoldAssignment) -> FoldOutcome,
    {
        folds.iter().map(evaluate).collect()
    }
}

fn check_configs(configs: &[EstimatorConfig]) -> Result<()> {
    if configs.is_empty() {
        return Err(Error::EmptyInput(
            "no estimator configurations to evaluate".to_string(),
        ));
    }
    let mut seen = HashSet::with_capacity(configs.len());
    match configs.iter().map(EstimatorConfig::identifier).find(|id| !seen.insert(*id)) {
        Some(dup) => Err(Error::InvalidInput(format!(
            "estimator identifier '{dup}' used by more than one configuration; set a distinct name"
        ))),
        None => Ok(()),
    }
}

/// Shared, read-only inputs for evaluating one configuration on one fold.
struct FoldUnit<'a> {
    runner: &'a CrossValidationRunner,
    dataset: &'a Dataset,
    config: &'a EstimatorConfig,
    scaled_columns: Option<&'a [usize]>,
    schema: &'a [(LabelScope, &'static str)],
    deadline: Option<Instant>,
}

impl FoldUnit<'_> {
    fn evaluate(&self, fold: &FoldAssignment) -> FoldOutcome {
        let estimator_id = self.config.identifier();
        let mut run = RunRecord::new(
            self.runner.config.experiment_id.clone(),
            estimator_id,
            fold.fold(),
        );

        if self.expired() {
            tracing::warn!(estimator = estimator_id, fold = fold.fold(), "time budget exhausted before fold started");
            run.complete(RunStatus::TimedOut);
            return self.sentinel(run, &Outcome::TimedOut);
        }

        run.start();
        tracing::debug!(
            estimator = estimator_id,
            fold = fold.fold(),
            train = fold.train().len(),
            test = fold.test().len(),
            "fitting fold"
        );

        match self.fit_and_score(fold) {
            Ok(_) if self.expired() => {
                tracing::warn!(estimator = estimator_id, fold = fold.fold(), "fold finished after time budget");
                run.complete(RunStatus::TimedOut);
                self.sentinel(run, &Outcome::TimedOut)
            }
            Ok((estimator, values)) => {
                run.complete(RunStatus::Success);
                let records = values
                    .into_iter()
                    .map(|(scope, metric, value)| {
                        MetricRecord::value(estimator_id, fold.fold(), scope, metric, value)
                    })
                    .collect();
                FoldOutcome {
                    run,
                    records,
                    model: Some(estimator),
                }
            }
            Err(err) => {
                tracing::warn!(estimator = estimator_id, fold = fold.fold(), error = %err, "fold failed");
                let cause = err.to_string();
                run.fail(cause.clone());
                self.sentinel(run, &Outcome::Failed { cause })
            }
        }
    }

    #[allow(clippy::type_complexity)]
    fn fit_and_score(
        &self,
        fold: &FoldAssignment,
    ) -> Result<(Box<dyn MultiLabelEstimator>, Vec<(LabelScope, &'static str, f64)>)> {
        let mut x_train = self.dataset.get_feature_matrix(fold.train())?;
        let mut x_test = self.dataset.get_feature_matrix(fold.test())?;
        if let Some(columns) = self.scaled_columns {
            let scaler = StandardScaler::fit(&x_train, columns)?;
            x_train = scaler.transform(&x_train)?;
            x_test = scaler.transform(&x_test)?;
        }
        let y_train = self.dataset.get_label_matrix(fold.train())?;
        let y_test = self.dataset.get_label_matrix(fold.test())?;

        let mut estimator = self.runner.registry.build(self.config)?;
        estimator.fit(&x_train, &y_train)?;
        let y_pred = estimator.predict(&x_test)?;
        let metrics = MultiLabelMetrics::compute(&y_test, &y_pred)?;
        Ok((estimator, metrics.values(self.dataset.label_names())))
    }

    fn sentinel(&self, run: RunRecord, outcome: &Outcome) -> FoldOutcome {
        let records = self
            .schema
            .iter()
            .map(|(scope, metric)| {
                MetricRecord::new(
                    run.estimator_id(),
                    run.fold(),
                    scope.clone(),
                    *metric,
                    outcome.clone(),
                )
            })
            .collect();
        FoldOutcome {
            run,
            records,
            model: None,
        }
    }

    fn expired(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }
}
