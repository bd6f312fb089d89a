//! Cross-validation over stratified folds and aggregation of the results
//!
//! [`CrossValidationRunner`] fits every estimator configuration on every fold
//! and emits one [`MetricRecord`](crate::experiment::MetricRecord) per
//! (estimator, fold, scope, metric); failures become sentinel records instead
//! of aborting the run. [`MetricsAggregator`] turns those records into
//! per-group mean and standard deviation.

mod aggregate;
mod runner;

pub use aggregate::{MetricsAggregator, SummaryTable};
pub use runner::{
    CrossValidationRun, CrossValidationRunner, FittedModel, RunnerConfig, RunnerConfigBuilder,
};
