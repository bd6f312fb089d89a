//! Run Record - one (estimator, fold) unit of a cross-validation experiment

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Run is created but not yet started.
    Pending,
    /// Run is currently executing.
    Running,
    /// Estimator fitted and scored.
    Success,
    /// Estimator construction, fitting or prediction failed.
    Failed,
    /// The configuration's time budget ran out.
    TimedOut,
}

/// Run Record represents fitting and scoring one estimator on one fold.
///
/// A run tracks the execution lifecycle from start to completion; failures
/// keep their cause so the sentinel metrics can be traced back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunRecord {
    run_id: String,
    experiment_id: String,
    estimator_id: String,
    fold: usize,
    status: RunStatus,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    failure: Option<String>,
}

impl RunRecord {
    /// Create a new run record in Pending status.
    ///
    /// The run ID is derived as `{experiment_id}/{estimator_id}/fold-{fold}`,
    /// so runs of different experiments never collide in one store.
    ///
    /// # Arguments
    ///
    /// * `experiment_id` - ID of the parent experiment
    /// * `estimator_id` - Identifier of the estimator configuration
    /// * `fold` - Fold number
    #[must_use]
    pub fn new(
        experiment_id: impl Into<String>,
        estimator_id: impl Into<String>,
        fold: usize,
    ) -> Self {
        let experiment_id = experiment_id.into();
        let estimator_id = estimator_id.into();
        Self {
            run_id: format!("{experiment_id}/{estimator_id}/fold-{fold}"),
            experiment_id,
            estimator_id,
            fold,
            status: RunStatus::Pending,
            started_at: None,
            ended_at: None,
            failure: None,
        }
    }

    /// Get the run ID.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Get the parent experiment ID.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Get the estimator identifier.
    #[must_use]
    pub fn estimator_id(&self) -> &str {
        &self.estimator_id
    }

    /// Get the fold number.
    #[must_use]
    pub const fn fold(&self) -> usize {
        self.fold
    }

    /// Get the current run status.
    #[must_use]
    pub const fn status(&self) -> RunStatus {
        self.status
    }

    /// Get the start timestamp, if the run has started.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Get the end timestamp, if the run has completed.
    #[must_use]
    pub const fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Get the failure cause, if the run failed.
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Start the run, transitioning from Pending to Running.
    ///
    /// Sets the `started_at` timestamp to now.
    pub fn start(&mut self) {
        self.status = RunStatus::Running;
        self.started_at = Some(Utc::now());
    }

    /// Complete the run with the given final status.
    ///
    /// Sets the `ended_at` timestamp to now.
    pub fn complete(&mut self, status: RunStatus) {
        self.status = status;
        self.ended_at = Some(Utc::now());
    }

    /// Complete the run as failed, keeping the cause.
    pub fn fail(&mut self, cause: impl Into<String>) {
        self.failure = Some(cause.into());
        self.complete(RunStatus::Failed);
    }
}
