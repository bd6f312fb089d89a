//! Experiment Tracking Schema
//!
//! Data structures produced by a cross-validation run and consumed by
//! experiment tracking.
//!
//! ## Schema Overview
//!
//! ```text
//! ExperimentRecord (1) ──< RunRecord (estimator × fold)
//!                              │
//!                              └──< MetricRecord (scope × metric) [value | failed | timed-out]
//!
//! MetricRecord (N) ──aggregate──> SummaryRecord (estimator × scope × metric)
//! ```
//!
//! Tracking services are reached through the [`ExperimentTracker`] trait, which
//! the runner receives as an argument; [`ExperimentStore`] is the in-memory
//! implementation.
//!
//! ## Usage
//!
//! ```rust
//! use genre_cv::experiment::{ExperimentRecord, LabelScope, MetricRecord, RunRecord, RunStatus};
//!
//! let experiment = ExperimentRecord::new("exp-001", "Baseline transforms");
//!
//! let mut run = RunRecord::new(experiment.experiment_id(), "BinaryRelevance", 0);
//! run.start();
//!
//! let metric = MetricRecord::value("BinaryRelevance", 0, LabelScope::label("rock"), "f1", 0.81);
//!
//! run.complete(RunStatus::Success);
//! ```

mod experiment_record;
mod metric_record;
mod run_record;
mod store;
mod summary_record;

pub use experiment_record::{ExperimentRecord, ExperimentRecordBuilder, FoldProtocol};
pub use metric_record::{LabelScope, MetricRecord, MetricRecordBuilder, Outcome};
pub use run_record::{RunRecord, RunStatus};
pub use store::ExperimentStore;
pub use summary_record::SummaryRecord;

use crate::Result;

/// Sink for experiment tracking data.
///
/// Remote tracking services implement this trait; the cross-validation core
/// only ever talks to it through a `&mut dyn ExperimentTracker` handed in by
/// the caller.
pub trait ExperimentTracker {
    /// Record the experiment a batch of runs belongs to.
    ///
    /// # Errors
    ///
    /// Implementation-defined; callers log and continue.
    fn log_experiment(&mut self, experiment: &ExperimentRecord) -> Result<()>;

    /// Record one finished (estimator, fold) run and its metric records.
    ///
    /// # Errors
    ///
    /// Implementation-defined; callers log and continue.
    fn log_run(&mut self, run: &RunRecord, metrics: &[MetricRecord]) -> Result<()>;
}
