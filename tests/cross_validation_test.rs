//! End-to-end cross-validation tests: runner, failure isolation, aggregation

use genre_cv::cv::{CrossValidationRunner, MetricsAggregator, RunnerConfig, SummaryTable};
use genre_cv::dataset::{Dataset, FeatureMatrix, LabelMatrix};
use genre_cv::estimator::{EstimatorConfig, EstimatorRegistry, MultiLabelEstimator};
use genre_cv::experiment::{ExperimentStore, LabelScope, Outcome, RunStatus};
use genre_cv::metrics::metric_schema;
use genre_cv::scaling::Scaling;
use genre_cv::{Error, Result};

/// Estimator whose fit always fails.
#[derive(Debug)]
struct Exploding;

impl MultiLabelEstimator for Exploding {
    fn kind(&self) -> &'static str {
        "Exploding"
    }

    fn fit(&mut self, _: &FeatureMatrix, _: &LabelMatrix) -> Result<()> {
        Err(Error::EstimatorFit("singular matrix".to_string()))
    }

    fn predict(&self, _: &FeatureMatrix) -> Result<LabelMatrix> {
        Err(Error::EstimatorFit("not fitted".to_string()))
    }
}

/// Two genres separable on energy, tempo on a much larger scale.
fn dataset() -> Dataset {
    let n = 40_u32;
    let rows: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            let energy = if i % 2 == 0 { 0.9 } else { 0.1 } + f64::from(i % 5) * 0.01;
            vec![energy, 80.0 + f64::from(i) * 2.0]
        })
        .collect();
    let labels: Vec<Vec<bool>> = (0..n).map(|i| vec![i % 2 == 0, i % 2 == 1]).collect();
    Dataset::new(
        (0..n).map(|i| format!("track-{i}")).collect(),
        vec!["energy".into(), "tempo".into()],
        vec!["rock".into(), "jazz".into()],
        FeatureMatrix::from_rows(&rows).unwrap(),
        LabelMatrix::from_rows(&labels).unwrap(),
    )
    .unwrap()
}

fn registry() -> EstimatorRegistry {
    let mut registry = EstimatorRegistry::with_defaults();
    registry.register("Exploding", |_, _| Ok(Box::new(Exploding)));
    registry
}

#[test]
fn test_failure_isolated_to_its_configuration() {
    let dataset = dataset();
    let runner = CrossValidationRunner::with_registry(RunnerConfig::default(), registry());
    let configs = [
        EstimatorConfig::new("Exploding"),
        EstimatorConfig::new("skmultilearn.problem_transform.BinaryRelevance"),
    ];
    let run = runner.run(&dataset, &configs, 4, 11).unwrap();

    let schema_len = metric_schema(dataset.label_names()).len();
    assert_eq!(run.records().len(), 2 * 4 * schema_len);
    assert_eq!(run.runs().len(), 8);

    for fold in 0..4 {
        for estimator in ["Exploding", "BinaryRelevance"] {
            let count = run
                .records()
                .iter()
                .filter(|r| r.estimator_id() == estimator && r.fold() == fold)
                .count();
            assert_eq!(count, schema_len, "{estimator} fold {fold}");
        }
    }

    let exploding: Vec<_> = run
        .records()
        .iter()
        .filter(|r| r.estimator_id() == "Exploding")
        .collect();
    assert!(exploding.iter().all(|r| r.is_sentinel()));
    assert!(matches!(
        exploding[0].outcome(),
        Outcome::Failed { cause } if cause.contains("singular matrix")
    ));

    let failed_runs: Vec<_> = run.unsuccessful_runs().collect();
    assert_eq!(failed_runs.len(), 4);
    assert!(failed_runs.iter().all(|r| r.status() == RunStatus::Failed));
    assert_eq!(run.models().len(), 4);
}

#[test]
fn test_aggregate_reports_excluded_folds() {
    let dataset = dataset();
    let runner = CrossValidationRunner::with_registry(RunnerConfig::default(), registry());
    let configs = [
        EstimatorConfig::new("Exploding"),
        EstimatorConfig::new("MajorityPrior"),
    ];
    let run = runner.run(&dataset, &configs, 4, 11).unwrap();
    let summaries = run.summarize().unwrap();

    let schema_len = metric_schema(dataset.label_names()).len();
    assert_eq!(summaries.len(), 2 * schema_len);

    for s in MetricsAggregator::summaries_for(&summaries, "Exploding") {
        assert_eq!(s.excluded_fold_count(), 4);
        assert_eq!(s.included_fold_count(), 0);
        assert!(s.mean().is_none());
        assert!(s.std().is_none());
    }
    for s in MetricsAggregator::summaries_for(&summaries, "MajorityPrior") {
        assert_eq!(s.excluded_fold_count(), 0);
        assert_eq!(s.included_fold_count(), 4);
    }

    let table = SummaryTable::new(&summaries).to_string();
    assert!(table.contains("0/4"));
    assert!(table.contains("4/4"));
}

#[test]
fn test_scaled_classifier_chain_learns_genres() {
    let dataset = dataset();
    let config = RunnerConfig::builder()
        .scaling(Scaling::All)
        .parallel(false)
        .build();
    let runner = CrossValidationRunner::new(config);
    let chain = EstimatorConfig::new("ClassifierChain").with_base_model(
        EstimatorConfig::new("LogisticRegression")
            .with_hyperparameter("max_iter", 300)
            .with_hyperparameter("learning_rate", 0.5),
    );
    let run = runner.run(&dataset, &[chain], 4, 5).unwrap();
    let summaries = run.summarize().unwrap();

    let f1 = MetricsAggregator::find(&summaries, "ClassifierChain", &LabelScope::Overall, "f1_micro_avg")
        .unwrap();
    assert!(f1.mean().unwrap() > 0.9, "micro F1 {:?}", f1.mean());
    assert!(run.model("ClassifierChain", 3).is_some());
}

#[test]
fn test_parallel_and_sequential_agree() {
    let dataset = dataset();
    let configs = [EstimatorConfig::new("LabelPowerset")];
    let sequential = CrossValidationRunner::new(RunnerConfig::builder().parallel(false).build())
        .run(&dataset, &configs, 4, 9)
        .unwrap();
    let parallel = CrossValidationRunner::new(RunnerConfig::builder().parallel(true).build())
        .run(&dataset, &configs, 4, 9)
        .unwrap();

    let values = |run: &genre_cv::cv::CrossValidationRun| -> Vec<(usize, String, Option<f64>)> {
        run.records()
            .iter()
            .map(|r| (r.fold(), r.metric().to_string(), r.metric_value()))
            .collect()
    };
    assert_eq!(values(&sequential), values(&parallel));
}

#[test]
fn test_tracked_run_persists() {
    let dataset = dataset();
    let runner = CrossValidationRunner::new(
        RunnerConfig::builder().experiment_id("genre-baselines").build(),
    );
    let mut store = ExperimentStore::new();
    let run = runner
        .run_tracked(
            &dataset,
            &[EstimatorConfig::new("MajorityPrior").with_name("prior")],
            4,
            2,
            &mut store,
        )
        .unwrap();
    store.add_summaries("genre-baselines", run.summarize().unwrap());

    let path = std::env::temp_dir().join(format!("genre-cv-store-{}.json", std::process::id()));
    store.save(&path).unwrap();
    let restored = ExperimentStore::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let experiment = restored.get_experiment("genre-baselines").unwrap();
    assert_eq!(experiment.dataset().unwrap().n_examples, 40);
    assert_eq!(experiment.estimators(), ["prior".to_string()]);
    assert_eq!(experiment.expected_runs(), Some(restored.run_count()));
    assert_eq!(restored.run_count(), 4);
    assert_eq!(restored.metric_count(), run.records().len());
    assert_eq!(
        restored.summaries("genre-baselines").len(),
        store.summaries("genre-baselines").len()
    );
    assert_eq!(
        restored
            .get_metrics("genre-baselines", "prior", &LabelScope::label("rock"), "support")
            .len(),
        4
    );
}

#[test]
fn test_experiments_tracked_into_one_store() {
    let dataset = dataset();
    let configs = [EstimatorConfig::new("MajorityPrior")];
    let mut store = ExperimentStore::new();

    for experiment in ["exp-a", "exp-b"] {
        let runner =
            CrossValidationRunner::new(RunnerConfig::builder().experiment_id(experiment).build());
        runner
            .run_tracked(&dataset, &configs, 3, 5, &mut store)
            .unwrap();
    }

    assert_eq!(store.experiment_count(), 2);
    assert_eq!(store.run_count(), 6);
    for experiment in ["exp-a", "exp-b"] {
        let runs = store.get_runs_for_experiment(experiment);
        assert_eq!(runs.len(), 3);
        assert!(runs.iter().all(|r| r.run_id().starts_with(experiment)));

        let f1 = store.get_metrics(experiment, "MajorityPrior", &LabelScope::Overall, "f1_micro_avg");
        let folds: Vec<usize> = f1.iter().map(|m| m.fold()).collect();
        assert_eq!(folds, vec![0, 1, 2]);
    }
}

#[test]
fn test_structural_errors_abort() {
    let dataset = dataset();
    let runner = CrossValidationRunner::new(RunnerConfig::default());
    let configs = [EstimatorConfig::new("MajorityPrior")];
    assert!(matches!(
        runner.run(&dataset, &configs, 1, 0),
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        runner.run(&dataset, &configs, 21, 0),
        Err(Error::InsufficientSamples { .. })
    ));
}
