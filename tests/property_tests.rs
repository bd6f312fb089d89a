//! Property-based tests for stratified splitting and aggregation
//!
//! - Test partition invariants over random label matrices
//! - Run with ProptestConfig::with_cases(100)

use genre_cv::cv::MetricsAggregator;
use genre_cv::dataset::{validate_folds, Dataset, FeatureMatrix, LabelMatrix};
use genre_cv::experiment::{LabelScope, MetricRecord};
use proptest::prelude::*;

// ============================================================================
// Property Test Generators (Strategies)
// ============================================================================

/// Random multi-label dataset; label `j` is also forced on every `(j + 2)`th
/// sample so each label has support of at least a quarter of the samples.
fn arb_dataset() -> impl Strategy<Value = Dataset> {
    (12usize..80, 1usize..=3)
        .prop_flat_map(|(n, n_labels)| {
            proptest::collection::vec(any::<bool>(), n * n_labels)
                .prop_map(move |bits| (n, n_labels, bits))
        })
        .prop_map(|(n, n_labels, bits)| {
            let labels: Vec<Vec<bool>> = (0..n)
                .map(|i| {
                    (0..n_labels)
                        .map(|j| bits[i * n_labels + j] || i % (j + 2) == 0)
                        .collect()
                })
                .collect();
            #[allow(clippy::cast_precision_loss)]
            let rows: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64]).collect();
            Dataset::new(
                (0..n).map(|i| format!("t{i}")).collect(),
                vec!["x".into()],
                (0..n_labels).map(|j| format!("genre{j}")).collect(),
                FeatureMatrix::from_rows(&rows).unwrap(),
                LabelMatrix::from_rows(&labels).unwrap(),
            )
            .unwrap()
        })
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: folds partition the samples (no leakage, no gaps)
    #[test]
    fn prop_split_is_partition(dataset in arb_dataset(), k in 2usize..=3, seed in any::<u64>()) {
        let folds = dataset.split(k, seed).unwrap();
        prop_assert_eq!(folds.len(), k);
        prop_assert!(validate_folds(&folds, dataset.n_samples()).is_ok());

        let mut tested: Vec<usize> = folds.iter().flat_map(|f| f.test().iter().copied()).collect();
        tested.sort_unstable();
        prop_assert_eq!(tested, (0..dataset.n_samples()).collect::<Vec<_>>());
    }

    /// Property: test fold sizes differ by at most one
    #[test]
    fn prop_fold_sizes_balanced(dataset in arb_dataset(), k in 2usize..=3, seed in any::<u64>()) {
        let folds = dataset.split(k, seed).unwrap();
        let n = dataset.n_samples();
        for fold in &folds {
            prop_assert!(fold.test().len() == n / k || fold.test().len() == n.div_ceil(k));
        }
    }

    /// Property: same seed, same folds
    #[test]
    fn prop_split_deterministic(dataset in arb_dataset(), k in 2usize..=3, seed in any::<u64>()) {
        prop_assert_eq!(dataset.split(k, seed).unwrap(), dataset.split(k, seed).unwrap());
    }

    /// Property: some label of minimum support is spread with per-fold counts
    /// differing by at most one
    #[test]
    fn prop_rarest_label_balanced(dataset in arb_dataset(), k in 2usize..=3, seed in any::<u64>()) {
        let folds = dataset.split(k, seed).unwrap();
        let supports = dataset.labels().supports();
        let min_support = supports.iter().copied().min().unwrap();

        let per_fold: Vec<Vec<usize>> = folds
            .iter()
            .map(|f| dataset.get_label_matrix(f.test()).unwrap().supports())
            .collect();
        let balanced = (0..supports.len())
            .filter(|&j| supports[j] == min_support)
            .any(|j| {
                let counts = per_fold.iter().map(|c| c[j]);
                counts.clone().max().unwrap() - counts.min().unwrap() <= 1
            });
        prop_assert!(balanced, "per-fold label counts {:?}", per_fold);
    }

    /// Property: mean lies within [min, max] of the fold values
    #[test]
    fn prop_mean_bounded(values in proptest::collection::vec(0.0f64..1.0, 1..10)) {
        let records: Vec<MetricRecord> = values
            .iter()
            .enumerate()
            .map(|(fold, &v)| MetricRecord::value("br", fold, LabelScope::Overall, "f1_macro_avg", v))
            .collect();
        let summaries = MetricsAggregator::aggregate(&records).unwrap();
        let summary = &summaries[0];
        let mean = summary.mean().unwrap();
        let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(mean >= lo - 1e-12 && mean <= hi + 1e-12);
        prop_assert!(summary.std().unwrap() >= 0.0);
    }
}
