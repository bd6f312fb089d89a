//! Splitting and cross-validation benchmarks
//!
//! - Iterative stratification across dataset sizes and label counts
//! - Metric computation for one fold
//! - A full cross-validation run of the frequency baseline

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use genre_cv::cv::{CrossValidationRunner, RunnerConfig};
use genre_cv::dataset::{Dataset, FeatureMatrix, LabelMatrix};
use genre_cv::estimator::EstimatorConfig;
use genre_cv::metrics::MultiLabelMetrics;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Dataset with `n_labels` labels of decreasing frequency.
#[allow(clippy::cast_precision_loss)]
fn create_dataset(n: usize, n_labels: usize) -> Dataset {
    let mut rng = StdRng::seed_from_u64(0);
    let rows: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64, rng.gen()]).collect();
    let labels: Vec<Vec<bool>> = (0..n)
        .map(|_| {
            (0..n_labels)
                .map(|j| rng.gen_bool(0.5 / (j as f64 + 1.0)))
                .collect()
        })
        .collect();
    Dataset::new(
        (0..n).map(|i| format!("track-{i}")).collect(),
        vec!["tempo".into(), "energy".into()],
        (0..n_labels).map(|j| format!("genre{j}")).collect(),
        FeatureMatrix::from_rows(&rows).unwrap(),
        LabelMatrix::from_rows(&labels).unwrap(),
    )
    .unwrap()
}

/// Benchmark stratified k-fold splitting
fn bench_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("split");

    for &(n, n_labels) in &[(1_000, 5), (10_000, 5), (10_000, 20)] {
        let dataset = create_dataset(n, n_labels);
        group.bench_with_input(
            BenchmarkId::new(format!("{n_labels}_labels"), n),
            &dataset,
            |b, dataset| {
                b.iter(|| dataset.split(black_box(5), black_box(42)).unwrap());
            },
        );
    }

    group.finish();
}

/// Benchmark metric computation for one fold
fn bench_metrics(c: &mut Criterion) {
    let dataset = create_dataset(10_000, 10);
    let indices: Vec<usize> = (0..dataset.n_samples()).collect();
    let y_true = dataset.get_label_matrix(&indices).unwrap();
    let reversed: Vec<usize> = indices.iter().rev().copied().collect();
    let y_pred = dataset.get_label_matrix(&reversed).unwrap();

    c.bench_function("metrics_10k_x_10", |b| {
        b.iter(|| MultiLabelMetrics::compute(black_box(&y_true), black_box(&y_pred)).unwrap());
    });
}

/// Benchmark a 5-fold run of the frequency baseline
fn bench_cross_validation(c: &mut Criterion) {
    let dataset = create_dataset(5_000, 5);
    let configs = [EstimatorConfig::new("MajorityPrior")];
    let runner = CrossValidationRunner::new(RunnerConfig::default());

    c.bench_function("cv_majority_prior_5k", |b| {
        b.iter(|| runner.run(&dataset, &configs, 5, 42).unwrap());
    });
}

criterion_group!(benches, bench_split, bench_metrics, bench_cross_validation);
criterion_main!(benches);
