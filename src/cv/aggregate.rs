//! Cross-fold aggregation of metric records

use crate::experiment::{LabelScope, MetricRecord, Outcome, SummaryRecord};
use crate::{Error, Result};
use std::collections::HashMap;
use std::fmt;

/// Reduces per-fold metric records to per-group summaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsAggregator;

impl MetricsAggregator {
    /// Group by (estimator, scope, metric) in order of first appearance and
    /// summarise each group's values.
    ///
    /// Sentinel outcomes are left out of mean and std and counted as
    /// excluded folds.
    ///
    /// # Errors
    ///
    /// Returns `EmptyInput` if `records` is empty.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use genre_cv::cv::MetricsAggregator;
    /// use genre_cv::experiment::{LabelScope, MetricRecord, Outcome};
    ///
    /// let mut records: Vec<MetricRecord> = [0.8, 0.82, 0.79]
    ///     .iter()
    ///     .enumerate()
    ///     .map(|(fold, &v)| MetricRecord::value("BinaryRelevance", fold, LabelScope::label("rock"), "f1", v))
    ///     .collect();
    /// records.push(MetricRecord::new("BinaryRelevance", 3, LabelScope::label("rock"), "f1", Outcome::TimedOut));
    ///
    /// let summaries = MetricsAggregator::aggregate(&records).unwrap();
    /// assert_eq!(summaries.len(), 1);
    /// assert_eq!(summaries[0].included_fold_count(), 3);
    /// assert_eq!(summaries[0].excluded_fold_count(), 1);
    /// ```
    pub fn aggregate(records: &[MetricRecord]) -> Result<Vec<SummaryRecord>> {
        if records.is_empty() {
            return Err(Error::EmptyInput(
                "cannot aggregate zero metric records".to_string(),
            ));
        }

        let mut index: HashMap<(&str, &LabelScope, &str), usize> = HashMap::new();
        let mut groups: Vec<(&MetricRecord, Vec<f64>, usize)> = Vec::new();
        for record in records {
            let key = (record.estimator_id(), record.scope(), record.metric());
            let slot = *index.entry(key).or_insert_with(|| {
                groups.push((record, Vec::new(), 0));
                groups.len() - 1
            });
            let (_, values, excluded) = &mut groups[slot];
            match record.outcome() {
                Outcome::Value { value } => values.push(*value),
                Outcome::Failed { .. } | Outcome::TimedOut => *excluded += 1,
            }
        }

        Ok(groups
            .into_iter()
            .map(|(first, values, excluded)| {
                SummaryRecord::from_values(
                    first.estimator_id(),
                    first.scope().clone(),
                    first.metric(),
                    &values,
                    excluded,
                )
            })
            .collect())
    }

    /// Summaries of one estimator, in their original order.
    #[must_use]
    pub fn summaries_for<'a>(
        summaries: &'a [SummaryRecord],
        estimator_id: &str,
    ) -> Vec<&'a SummaryRecord> {
        summaries
            .iter()
            .filter(|s| s.estimator_id() == estimator_id)
            .collect()
    }

    /// Summary for one (estimator, scope, metric) group.
    #[must_use]
    pub fn find<'a>(
        summaries: &'a [SummaryRecord],
        estimator_id: &str,
        scope: &LabelScope,
        metric: &str,
    ) -> Option<&'a SummaryRecord> {
        summaries.iter().find(|s| {
            s.estimator_id() == estimator_id && s.scope() == scope && s.metric() == metric
        })
    }
}

/// Fixed-width text rendering of summaries.
///
/// Groups with no included fold show `-` for mean and std.
#[derive(Debug, Clone, Copy)]
pub struct SummaryTable<'a> {
    summaries: &'a [SummaryRecord],
}

impl<'a> SummaryTable<'a> {
    /// Table over the given summaries.
    #[must_use]
    pub const fn new(summaries: &'a [SummaryRecord]) -> Self {
        Self { summaries }
    }
}

impl fmt::Display for SummaryTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<24} {:<16} {:<24} {:>8} {:>8} {:>8}",
            "estimator", "scope", "metric", "mean", "std", "folds"
        )?;
        for s in self.summaries {
            let mean = s.mean().map_or_else(|| "-".to_string(), |m| format!("{m:.4}"));
            let std = s.std().map_or_else(|| "-".to_string(), |d| format!("{d:.4}"));
            let folds = format!(
                "{}/{}",
                s.included_fold_count(),
                s.included_fold_count() + s.excluded_fold_count()
            );
            writeln!(
                f,
                "{:<24} {:<16} {:<24} {:>8} {:>8} {:>8}",
                s.estimator_id(),
                s.scope().to_string(),
                s.metric(),
                mean,
                std,
                folds
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f1(estimator: &str, fold: usize, value: f64) -> MetricRecord {
        MetricRecord::value(estimator, fold, LabelScope::label("rock"), "f1", value)
    }

    #[test]
    fn test_groups_in_first_appearance_order() {
        let records = vec![
            f1("b", 0, 0.5),
            MetricRecord::value("a", 0, LabelScope::Overall, "hamming_loss", 0.1),
            f1("b", 1, 0.7),
            MetricRecord::value("a", 1, LabelScope::Overall, "hamming_loss", 0.3),
        ];
        let summaries = MetricsAggregator::aggregate(&records).unwrap();

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].estimator_id(), "b");
        assert!((summaries[0].mean().unwrap() - 0.6).abs() < 1e-12);
        assert_eq!(summaries[1].metric(), "hamming_loss");
        assert!((summaries[1].mean().unwrap() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_failed_folds_excluded() {
        let mut records = vec![f1("cc", 0, 0.6), f1("cc", 2, 0.8)];
        records.insert(
            1,
            MetricRecord::new(
                "cc",
                1,
                LabelScope::label("rock"),
                "f1",
                Outcome::Failed {
                    cause: "diverged".to_string(),
                },
            ),
        );

        let summaries = MetricsAggregator::aggregate(&records).unwrap();
        let s = &summaries[0];
        assert!((s.mean().unwrap() - 0.7).abs() < 1e-12);
        assert_eq!(s.included_fold_count(), 2);
        assert_eq!(s.excluded_fold_count(), 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(
            MetricsAggregator::aggregate(&[]),
            Err(Error::EmptyInput(_))
        ));
    }

    #[test]
    fn test_summaries_for_and_table() {
        let records = vec![f1("lp", 0, 0.5), f1("br", 0, 0.9)];
        let summaries = MetricsAggregator::aggregate(&records).unwrap();

        let lp = MetricsAggregator::summaries_for(&summaries, "lp");
        assert_eq!(lp.len(), 1);
        assert!(MetricsAggregator::find(&summaries, "br", &LabelScope::label("rock"), "f1").is_some());

        let table = SummaryTable::new(&summaries).to_string();
        assert_eq!(table.lines().count(), 3);
        assert!(table.contains("0.9000"));
        assert!(table.contains("1/1"));
    }
}
