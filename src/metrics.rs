//! Multi-label classification metrics
//!
//! Per-label precision, recall, F1 and support, their micro / macro /
//! weighted / samples averages, Hamming loss and support-weighted Jaccard.
//! Every ratio with a zero denominator is 0.
//!
//! The set of `(scope, metric)` pairs is fixed for a label vocabulary
//! ([`metric_schema`]), so failure sentinels can mirror a successful fold
//! record for record.

use crate::dataset::LabelMatrix;
use crate::experiment::LabelScope;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Metrics reported for every label, in record order.
pub const PER_LABEL_METRICS: [&str; 4] = ["precision", "recall", "f1", "support"];

/// Metrics reported once per fold, in record order.
pub const OVERALL_METRICS: [&str; 14] = [
    "weighted_jaccard",
    "hamming_loss",
    "precision_micro_avg",
    "recall_micro_avg",
    "f1_micro_avg",
    "precision_macro_avg",
    "recall_macro_avg",
    "f1_macro_avg",
    "precision_weighted_avg",
    "recall_weighted_avg",
    "f1_weighted_avg",
    "precision_samples_avg",
    "recall_samples_avg",
    "f1_samples_avg",
];

/// Ordered `(scope, metric)` pairs produced for a label vocabulary.
#[must_use]
pub fn metric_schema(label_names: &[String]) -> Vec<(LabelScope, &'static str)> {
    let per_label = label_names.iter().flat_map(|name| {
        PER_LABEL_METRICS
            .iter()
            .map(move |&metric| (LabelScope::Label(name.clone()), metric))
    });
    let overall = OVERALL_METRICS
        .iter()
        .map(|&metric| (LabelScope::Overall, metric));
    per_label.chain(overall).collect()
}

/// Scores for a single label
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabelScores {
    /// TP / (TP + FP)
    pub precision: f64,
    /// TP / (TP + FN)
    pub recall: f64,
    /// Harmonic mean of precision and recall
    pub f1: f64,
    /// Number of true positives in the ground truth
    pub support: usize,
}

/// Precision / recall / F1 under one averaging strategy
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Averages {
    /// Averaged precision
    pub precision: f64,
    /// Averaged recall
    pub recall: f64,
    /// Averaged F1
    pub f1: f64,
}

/// Full metric set for one prediction
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MultiLabelMetrics {
    /// Per-label scores, index-aligned with the label vocabulary
    pub per_label: Vec<LabelScores>,
    /// Global TP / FP / FN counts
    pub micro: Averages,
    /// Unweighted mean over labels
    pub macro_avg: Averages,
    /// Mean over labels weighted by support
    pub weighted: Averages,
    /// Mean over samples
    pub samples: Averages,
    /// Fraction of wrong label indicators
    pub hamming_loss: f64,
    /// Per-label Jaccard index weighted by support
    pub weighted_jaccard: f64,
}

#[derive(Clone, Copy, Default)]
struct Counts {
    tp: usize,
    fp: usize,
    fn_: usize,
}

impl MultiLabelMetrics {
    /// Compare predictions with ground truth.
    ///
    /// # Errors
    ///
    /// - `ShapeMismatch` if the matrices differ in shape
    /// - `EmptyInput` if there are no rows
    pub fn compute(y_true: &LabelMatrix, y_pred: &LabelMatrix) -> Result<Self> {
        if y_true.n_rows() != y_pred.n_rows() || y_true.n_labels() != y_pred.n_labels() {
            return Err(Error::ShapeMismatch {
                expected: format!("{}x{}", y_true.n_rows(), y_true.n_labels()),
                actual: format!("{}x{}", y_pred.n_rows(), y_pred.n_labels()),
            });
        }
        if y_true.n_rows() == 0 {
            return Err(Error::EmptyInput("no samples to score".to_string()));
        }

        let n_labels = y_true.n_labels();
        let mut counts = vec![Counts::default(); n_labels];
        let mut samples = Averages::default();
        let mut mismatches = 0usize;

        for (truth, pred) in y_true.rows().zip(y_pred.rows()) {
            let mut row = Counts::default();
            for (j, (&t, &p)) in truth.iter().zip(pred).enumerate() {
                match (t, p) {
                    (true, true) => {
                        counts[j].tp += 1;
                        row.tp += 1;
                    }
                    (false, true) => {
                        counts[j].fp += 1;
                        row.fp += 1;
                    }
                    (true, false) => {
                        counts[j].fn_ += 1;
                        row.fn_ += 1;
                    }
                    (false, false) => {}
                }
            }
            mismatches += row.fp + row.fn_;
            samples.precision += ratio(row.tp, row.tp + row.fp);
            samples.recall += ratio(row.tp, row.tp + row.fn_);
            samples.f1 += ratio(2 * row.tp, 2 * row.tp + row.fp + row.fn_);
        }

        #[allow(clippy::cast_precision_loss)]
        let n_rows = y_true.n_rows() as f64;
        samples.precision /= n_rows;
        samples.recall /= n_rows;
        samples.f1 /= n_rows;

        let per_label: Vec<LabelScores> = counts
            .iter()
            .map(|c| LabelScores {
                precision: ratio(c.tp, c.tp + c.fp),
                recall: ratio(c.tp, c.tp + c.fn_),
                f1: ratio(2 * c.tp, 2 * c.tp + c.fp + c.fn_),
                support: c.tp + c.fn_,
            })
            .collect();

        let total = counts.iter().fold(Counts::default(), |acc, c| Counts {
            tp: acc.tp + c.tp,
            fp: acc.fp + c.fp,
            fn_: acc.fn_ + c.fn_,
        });
        let micro = Averages {
            precision: ratio(total.tp, total.tp + total.fp),
            recall: ratio(total.tp, total.tp + total.fn_),
            f1: ratio(2 * total.tp, 2 * total.tp + total.fp + total.fn_),
        };

        #[allow(clippy::cast_precision_loss)]
        let macro_avg = Averages {
            precision: per_label.iter().map(|s| s.precision).sum::<f64>() / n_labels as f64,
            recall: per_label.iter().map(|s| s.recall).sum::<f64>() / n_labels as f64,
            f1: per_label.iter().map(|s| s.f1).sum::<f64>() / n_labels as f64,
        };

        let weights: Vec<usize> = per_label.iter().map(|s| s.support).collect();
        let weighted = Averages {
            precision: weighted_mean(per_label.iter().map(|s| s.precision), &weights),
            recall: weighted_mean(per_label.iter().map(|s| s.recall), &weights),
            f1: weighted_mean(per_label.iter().map(|s| s.f1), &weights),
        };

        let jaccard = counts.iter().map(|c| ratio(c.tp, c.tp + c.fp + c.fn_));
        let weighted_jaccard = weighted_mean(jaccard, &weights);

        #[allow(clippy::cast_precision_loss)]
        let hamming_loss = mismatches as f64 / (n_rows * n_labels as f64);

        Ok(Self {
            per_label,
            micro,
            macro_avg,
            weighted,
            samples,
            hamming_loss,
            weighted_jaccard,
        })
    }

    /// Metric values in [`metric_schema`] order.
    #[must_use]
    pub fn values(&self, label_names: &[String]) -> Vec<(LabelScope, &'static str, f64)> {
        let mut values = Vec::with_capacity(
            label_names.len() * PER_LABEL_METRICS.len() + OVERALL_METRICS.len(),
        );
        for (name, scores) in label_names.iter().zip(&self.per_label) {
            #[allow(clippy::cast_precision_loss)]
            let per_label = [
                scores.precision,
                scores.recall,
                scores.f1,
                scores.support as f64,
            ];
            for (metric, value) in PER_LABEL_METRICS.iter().zip(per_label) {
                values.push((LabelScope::Label(name.clone()), *metric, value));
            }
        }
        let overall = [
            self.weighted_jaccard,
            self.hamming_loss,
            self.micro.precision,
            self.micro.recall,
            self.micro.f1,
            self.macro_avg.precision,
            self.macro_avg.recall,
            self.macro_avg.f1,
            self.weighted.precision,
            self.weighted.recall,
            self.weighted.f1,
            self.samples.precision,
            self.samples.recall,
            self.samples.f1,
        ];
        for (metric, value) in OVERALL_METRICS.iter().zip(overall) {
            values.push((LabelScope::Overall, *metric, value));
        }
        values
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

#[allow(clippy::cast_precision_loss)]
fn weighted_mean(values: impl Iterator<Item = f64>, weights: &[usize]) -> f64 {
    let total: usize = weights.iter().sum();
    if total == 0 {
        return 0.0;
    }
    values
        .zip(weights)
        .map(|(v, &w)| v * w as f64)
        .sum::<f64>()
        / total as f64
}
