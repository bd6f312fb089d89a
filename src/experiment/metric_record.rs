//! Metric Record - one evaluation outcome per (estimator, fold, scope, metric)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which part of the label vocabulary a metric describes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelScope {
    /// Aggregate over all labels
    Overall,
    /// A single label, by name
    Label(String),
}

impl LabelScope {
    /// Scope for a named label.
    #[must_use]
    pub fn label(name: impl Into<String>) -> Self {
        Self::Label(name.into())
    }
}

impl fmt::Display for LabelScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overall => f.write_str("overall"),
            Self::Label(name) => f.write_str(name),
        }
    }
}

/// Result of evaluating one metric on one fold.
///
/// The sentinel variants stand in for values that could not be produced, so a
/// finished run covers every (estimator, fold) pair without gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Metric computed successfully
    Value {
        /// Metric value
        value: f64,
    },
    /// Estimator construction, fitting or prediction failed
    Failed {
        /// Error message of the failure
        cause: String,
    },
    /// Time budget of the estimator configuration ran out
    TimedOut,
}

impl Outcome {
    /// True for the `Failed` and `TimedOut` sentinels.
    #[must_use]
    pub const fn is_sentinel(&self) -> bool {
        !matches!(self, Self::Value { .. })
    }
}

/// Metric Record represents a single evaluation outcome.
///
/// Records are immutable once created; `estimator_id` + `scope` + `metric`
/// form the grouping key used by aggregation, `fold` orders them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricRecord {
    estimator_id: String,
    fold: usize,
    scope: LabelScope,
    metric: String,
    outcome: Outcome,
    timestamp: DateTime<Utc>,
}

impl MetricRecord {
    /// Create a new metric record.
    ///
    /// # Arguments
    ///
    /// * `estimator_id` - Identifier of the estimator configuration
    /// * `fold` - Fold number
    /// * `scope` - Label the metric describes, or overall
    /// * `metric` - Metric name (e.g., "f1", "hamming_loss")
    /// * `outcome` - Value or sentinel
    ///
    /// # Returns
    ///
    /// A new `MetricRecord` with the current timestamp.
    #[must_use]
    pub fn new(
        estimator_id: impl Into<String>,
        fold: usize,
        scope: LabelScope,
        metric: impl Into<String>,
        outcome: Outcome,
    ) -> Self {
        Self::builder(estimator_id, fold, scope, metric, outcome).build()
    }

    /// Create a successful record holding `value`.
    #[must_use]
    pub fn value(
        estimator_id: impl Into<String>,
        fold: usize,
        scope: LabelScope,
        metric: impl Into<String>,
        value: f64,
    ) -> Self {
        Self::new(estimator_id, fold, scope, metric, Outcome::Value { value })
    }

    /// Create a builder for constructing a metric record with optional fields.
    #[must_use]
    pub fn builder(
        estimator_id: impl Into<String>,
        fold: usize,
        scope: LabelScope,
        metric: impl Into<String>,
        outcome: Outcome,
    ) -> MetricRecordBuilder {
        MetricRecordBuilder::new(estimator_id, fold, scope, metric, outcome)
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

    /// Get the outcome.
    #[must_use]
    pub const fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Get the metric value, if the fold succeeded.
    #[must_use]
    pub const fn metric_value(&self) -> Option<f64> {
        match self.outcome {
            Outcome::Value { value } => Some(value),
            _ => None,
        }
    }

    /// True if this record is a failure or time-out sentinel.
    #[must_use]
    pub const fn is_sentinel(&self) -> bool {
        self.outcome.is_sentinel()
    }

    /// Get the timestamp when the metric was recorded.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Builder for `MetricRecord`.
#[derive(Debug)]
pub struct MetricRecordBuilder {
    estimator_id: String,
    fold: usize,
    scope: LabelScope,
    metric: String,
    outcome: Outcome,
    timestamp: DateTime<Utc>,
}

impl MetricRecordBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(
        estimator_id: impl Into<String>,
        fold: usize,
        scope: LabelScope,
        metric: impl Into<String>,
        outcome: Outcome,
    ) -> Self {
        Self {
            estimator_id: estimator_id.into(),
            fold,
            scope,
            metric: metric.into(),
            outcome,
            timestamp: Utc::now(),
        }
    }

    /// Set a custom timestamp.
    #[must_use]
    pub const fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Build the `MetricRecord`.
    #[must_use]
    pub fn build(self) -> MetricRecord {
        MetricRecord {
            estimator_id: self.estimator_id,
            fold: self.fold,
            scope: self.scope,
            metric: self.metric,
            outcome: self.outcome,
            timestamp: self.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_record_value() {
        let metric = MetricRecord::value("BinaryRelevance", 0, LabelScope::label("rock"), "f1", 0.5);
        assert_eq!(metric.estimator_id(), "BinaryRelevance");
        assert_eq!(metric.scope(), &LabelScope::label("rock"));
        assert_eq!(metric.metric(), "f1");
        assert_eq!(metric.fold(), 0);
        assert!(!metric.is_sentinel());
        assert!((metric.metric_value().unwrap() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_sentinels_have_no_value() {
        let failed = MetricRecord::new(
            "ClassifierChain",
            2,
            LabelScope::Overall,
            "hamming_loss",
            Outcome::Failed {
                cause: "singular".to_string(),
            },
        );
        assert!(failed.is_sentinel());
        assert!(failed.metric_value().is_none());

        let timed_out =
            MetricRecord::new("ClassifierChain", 3, LabelScope::Overall, "f1", Outcome::TimedOut);
        assert!(timed_out.is_sentinel());
    }

    #[test]
    fn test_scope_display() {
        assert_eq!(LabelScope::Overall.to_string(), "overall");
        assert_eq!(LabelScope::label("jazz").to_string(), "jazz");
    }
}
