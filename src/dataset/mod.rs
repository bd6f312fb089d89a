//! Multi-label dataset with label-distribution-aware partitioning
//!
//! A [`Dataset`] owns the engineered features, the multi-hot genre labels, the
//! sample identifiers and the label vocabulary. It is read-only once built.
//!
//! ## Usage
//!
//! ```rust
//! use genre_cv::dataset::{Dataset, FeatureMatrix, LabelMatrix};
//!
//! # fn main() -> genre_cv::Result<()> {
//! let features = FeatureMatrix::from_rows(&[
//!     vec![0.1, 120.0],
//!     vec![0.7, 98.0],
//!     vec![0.4, 128.0],
//!     vec![0.9, 87.0],
//! ])?;
//! let labels = LabelMatrix::from_rows(&[
//!     vec![true, false],
//!     vec![false, true],
//!     vec![true, true],
//!     vec![false, true],
//! ])?;
//! let dataset = Dataset::new(
//!     vec!["t1".into(), "t2".into(), "t3".into(), "t4".into()],
//!     vec!["energy".into(), "tempo".into()],
//!     vec!["rock".into(), "jazz".into()],
//!     features,
//!     labels,
//! )?;
//!
//! let folds = dataset.split(2, 42)?;
//! assert_eq!(folds.len(), 2);
//! # Ok(())
//! # }
//! ```

mod ingest;
mod matrix;
mod stratify;

pub use matrix::{FeatureMatrix, LabelMatrix};

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Samples, labels and vocabulary for a multi-label experiment.
///
/// Deserialization goes through [`Dataset::new`], so a decoded dataset holds
/// the same invariants as a constructed one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawDataset")]
pub struct Dataset {
    ids: Vec<String>,
    feature_names: Vec<String>,
    label_names: Vec<String>,
    features: FeatureMatrix,
    labels: LabelMatrix,
}

impl Dataset {
    /// Create a dataset, validating its invariants.
    ///
    /// # Errors
    ///
    /// - `EmptyInput` if there are no samples
    /// - `ShapeMismatch` if ids, features, labels or vocabularies disagree
    /// - `DuplicateSampleId` if two samples share an id
    /// - `InvalidInput` on duplicate feature/label names or non-finite features
    pub fn new(
        ids: Vec<String>,
        feature_names: Vec<String>,
        label_names: Vec<String>,
        features: FeatureMatrix,
        labels: LabelMatrix,
    ) -> Result<Self> {
        if ids.is_empty() {
            return Err(Error::EmptyInput("dataset has no samples".to_string()));
        }
        if features.n_rows() != ids.len() || labels.n_rows() != ids.len() {
            return Err(Error::ShapeMismatch {
                expected: format!("{} rows (one per id)", ids.len()),
                actual: format!(
                    "{} feature rows, {} label rows",
                    features.n_rows(),
                    labels.n_rows()
                ),
            });
        }
        if feature_names.len() != features.n_cols() {
            return Err(Error::ShapeMismatch {
                expected: format!("{} feature names", features.n_cols()),
                actual: format!("{}", feature_names.len()),
            });
        }
        if label_names.len() != labels.n_labels() {
            return Err(Error::ShapeMismatch {
                expected: format!("{} label names", labels.n_labels()),
                actual: format!("{}", label_names.len()),
            });
        }

        let mut seen = HashSet::with_capacity(ids.len());
        if let Some(dup) = ids.iter().find(|id| !seen.insert(id.as_str())) {
            return Err(Error::DuplicateSampleId(dup.clone()));
        }
        check_unique_names("feature", &feature_names)?;
        check_unique_names("label", &label_names)?;

        if !features.is_finite() {
            return Err(Error::InvalidInput(
                "features contain NaN or infinite values".to_string(),
            ));
        }

        Ok(Self {
            ids,
            feature_names,
            label_names,
            features,
            labels,
        })
    }

    /// Number of samples.
    #[must_use]
    pub const fn n_samples(&self) -> usize {
        self.labels.n_rows()
    }

    /// Sample identifiers, in sample order.
    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Feature names, index-aligned with feature columns.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Label vocabulary, index-aligned with label columns.
    #[must_use]
    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }

    /// All features.
    #[must_use]
    pub const fn features(&self) -> &FeatureMatrix {
        &self.features
    }

    /// All labels.
    #[must_use]
    pub const fn labels(&self) -> &LabelMatrix {
        &self.labels
    }

    /// Features of the given samples.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` on an invalid index.
    pub fn get_feature_matrix(&self, indices: &[usize]) -> Result<FeatureMatrix> {
        self.features.select_rows(indices)
    }

    /// Labels of the given samples.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` on an invalid index.
    pub fn get_label_matrix(&self, indices: &[usize]) -> Result<LabelMatrix> {
        self.labels.select_rows(indices)
    }

    /// Ids of the given samples.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` on an invalid index.
    pub fn get_ids(&self, indices: &[usize]) -> Result<Vec<String>> {
        indices
            .iter()
            .map(|&i| {
                self.ids.get(i).cloned().ok_or(Error::IndexOutOfRange {
                    index: i,
                    len: self.ids.len(),
                })
            })
            .collect()
    }

    /// Partition into `k` stratified folds.
    ///
    /// Every sample lands in exactly one test fold; test folds differ in size
    /// by at most one. A label of minimum support is spread across folds with
    /// counts differing by at most one; other labels are balanced
    /// best-effort, most frequent labels last.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` unless `2 <= k <= n_samples()`
    /// - `InsufficientSamples` if a label occurs fewer than `k` times
    pub fn split(&self, k: usize, seed: u64) -> Result<Vec<FoldAssignment>> {
        let n = self.n_samples();
        if k < 2 || k > n {
            return Err(Error::InvalidInput(format!(
                "fold count must be between 2 and {n}, got {k}"
            )));
        }
        self.check_label_support(k)?;

        let tests = stratify::iterative_stratification(&self.labels, &vec![1.0; k], seed);
        Ok(tests
            .into_iter()
            .enumerate()
            .map(|(fold, test)| FoldAssignment::from_test(fold, test, n))
            .collect())
    }

    /// Single stratified train/test split.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` unless `0 < test_size < 1` and both sides get samples
    /// - `InsufficientSamples` if a label occurs fewer than twice
    pub fn train_test_split(&self, test_size: f64, seed: u64) -> Result<FoldAssignment> {
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(Error::InvalidInput(format!(
                "test_size must be in (0, 1), got {test_size}"
            )));
        }
        let n = self.n_samples();
        let proportions = [test_size, 1.0 - test_size];
        if stratify::fold_capacities(n, &proportions).contains(&0) {
            return Err(Error::InvalidInput(format!(
                "test_size {test_size} leaves an empty partition for {n} samples"
            )));
        }
        self.check_label_support(2)?;

        let mut folds = stratify::iterative_stratification(&self.labels, &proportions, seed);
        let test = folds.swap_remove(0);
        Ok(FoldAssignment::from_test(0, test, n))
    }

    /// Dataset description for experiment logs.
    #[must_use]
    pub fn characteristics(&self) -> DatasetCharacteristics {
        DatasetCharacteristics {
            features: self.feature_names.clone(),
            labels: self.label_names.clone(),
            n_features: self.feature_names.len(),
            n_labels: self.label_names.len(),
            n_examples: self.n_samples(),
            label_support: self.labels.supports(),
            seed: None,
            fold: None,
            n_train_examples: None,
            n_test_examples: None,
        }
    }

    /// Dataset description for one fold of a split.
    #[must_use]
    pub fn fold_characteristics(&self, fold: &FoldAssignment, seed: u64) -> DatasetCharacteristics {
        DatasetCharacteristics {
            seed: Some(seed),
            fold: Some(fold.fold()),
            n_train_examples: Some(fold.train().len()),
            n_test_examples: Some(fold.test().len()),
            ..self.characteristics()
        }
    }

    fn check_label_support(&self, required: usize) -> Result<()> {
        let supports = self.labels.supports();
        match supports.iter().position(|&s| s < required) {
            Some(l) => Err(Error::InsufficientSamples {
                label: self.label_names[l].clone(),
                support: supports[l],
                required,
            }),
            None => Ok(()),
        }
    }
}

fn check_unique_names(kind: &str, names: &[String]) -> Result<()> {
    let mut seen = HashSet::with_capacity(names.len());
    match names.iter().find(|name| !seen.insert(name.as_str())) {
        Some(dup) => Err(Error::InvalidInput(format!("duplicate {kind} name '{dup}'"))),
        None => Ok(()),
    }
}

/// Train/test partition of sample indices for one fold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldAssignment {
    fold: usize,
    train: Vec<usize>,
    test: Vec<usize>,
}

impl FoldAssignment {
    /// Build a fold whose train set is the complement of `test` in `0..n`.
    #[must_use]
    pub fn from_test(fold: usize, mut test: Vec<usize>, n: usize) -> Self {
        test.sort_unstable();
        let mut in_test = vec![false; n];
        for &i in &test {
            if i < n {
                in_test[i] = true;
            }
        }
        let train = (0..n).filter(|&i| !in_test[i]).collect();
        Self { fold, train, test }
    }

    /// Fold number, starting at 0.
    #[must_use]
    pub const fn fold(&self) -> usize {
        self.fold
    }

    /// Training indices, ascending.
    #[must_use]
    pub fn train(&self) -> &[usize] {
        &self.train
    }

    /// Test indices, ascending.
    #[must_use]
    pub fn test(&self) -> &[usize] {
        &self.test
    }

    /// Check that train and test are disjoint and together cover `0..n`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFold` describing the first violation.
    pub fn validate(&self, n: usize) -> Result<()> {
        let mut seen = vec![false; n];
        for &i in self.train.iter().chain(&self.test) {
            if i >= n {
                return Err(Error::InvalidFold(format!(
                    "fold {}: index {i} outside 0..{n}",
                    self.fold
                )));
            }
            if seen[i] {
                return Err(Error::InvalidFold(format!(
                    "fold {}: sample {i} appears in both train and test",
                    self.fold
                )));
            }
            seen[i] = true;
        }
        if let Some(missing) = seen.iter().position(|&s| !s) {
            return Err(Error::InvalidFold(format!(
                "fold {}: sample {missing} is in neither train nor test",
                self.fold
            )));
        }
        Ok(())
    }
}

/// Validate a complete k-fold split: each fold is a partition of `0..n` and
/// every sample is tested exactly once.
///
/// # Errors
///
/// Returns `InvalidFold` describing the first violation.
pub fn validate_folds(folds: &[FoldAssignment], n: usize) -> Result<()> {
    let mut tested = vec![0usize; n];
    for fold in folds {
        fold.validate(n)?;
        for &i in fold.test() {
            tested[i] += 1;
        }
    }
    match tested.iter().position(|&t| t != 1) {
        Some(i) => Err(Error::InvalidFold(format!(
            "sample {i} is tested {} times across folds",
            tested[i]
        ))),
        None => Ok(()),
    }
}

/// Dataset description logged alongside experiment runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetCharacteristics {
    /// Feature names
    pub features: Vec<String>,
    /// Label vocabulary
    pub labels: Vec<String>,
    /// Number of features
    pub n_features: usize,
    /// Number of labels
    pub n_labels: usize,
    /// Number of samples
    pub n_examples: usize,
    /// Positive samples per label
    pub label_support: Vec<usize>,
    /// Seed of the split, if this describes a fold
    pub seed: Option<u64>,
    /// Fold number, if this describes a fold
    pub fold: Option<usize>,
    /// Training samples in the fold
    pub n_train_examples: Option<usize>,
    /// Test samples in the fold
    pub n_test_examples: Option<usize>,
}

#[derive(Deserialize)]
struct RawDataset {
    ids: Vec<String>,
    feature_names: Vec<String>,
    label_names: Vec<String>,
    features: FeatureMatrix,
    labels: LabelMatrix,
}

impl TryFrom<RawDataset> for Dataset {
    type Error = Error;

    fn try_from(raw: RawDataset) -> Result<Self> {
        Self::new(
            raw.ids,
            raw.feature_names,
            raw.label_names,
            raw.features,
            raw.labels,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_dataset() -> Dataset {
        let n = 12_u32;
        let features = FeatureMatrix::from_rows(
            &(0..n).map(|i| vec![f64::from(i), 1.0]).collect::<Vec<_>>(),
        )
        .unwrap();
        let labels = LabelMatrix::from_rows(
            &(0..n).map(|i| vec![i % 2 == 0, i % 3 == 0]).collect::<Vec<_>>(),
        )
        .unwrap();
        Dataset::new(
            (0..n).map(|i| format!("track-{i}")).collect(),
            vec!["energy".into(), "bias".into()],
            vec!["rock".into(), "jazz".into()],
            features,
            labels,
        )
        .unwrap()
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let features = FeatureMatrix::from_rows(&[vec![1.0], vec![2.0]]).unwrap();
        let labels = LabelMatrix::from_rows(&[vec![true], vec![false]]).unwrap();
        let err = Dataset::new(
            vec!["a".into(), "a".into()],
            vec!["f".into()],
            vec!["rock".into()],
            features,
            labels,
        )
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateSampleId(id) if id == "a"));
    }

    #[test]
    fn test_deserialize_validates() {
        let json = serde_json::to_string(&toy_dataset()).unwrap();
        let restored: Dataset = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.ids(), toy_dataset().ids());
        assert_eq!(
            restored.get_label_matrix(&[11]).unwrap(),
            toy_dataset().get_label_matrix(&[11]).unwrap()
        );

        let duplicate_ids = r#"{
            "ids": ["a", "a", "b"],
            "feature_names": ["f"],
            "label_names": ["rock"],
            "features": {"n_rows": 3, "n_cols": 1, "values": [0.1, 0.2, 0.3]},
            "labels": {"n_rows": 3, "n_labels": 1, "values": [true, true, false]}
        }"#;
        let err = serde_json::from_str::<Dataset>(duplicate_ids).unwrap_err();
        assert!(err.to_string().contains("Duplicate sample id"), "{err}");

        let short_labels = r#"{
            "ids": ["a", "b", "c"],
            "feature_names": ["f"],
            "label_names": ["rock"],
            "features": {"n_rows": 3, "n_cols": 1, "values": [0.1, 0.2, 0.3]},
            "labels": {"n_rows": 3, "n_labels": 1, "values": [true, true]}
        }"#;
        assert!(serde_json::from_str::<Dataset>(short_labels).is_err());

        let mismatched_rows = r#"{
            "ids": ["a", "b"],
            "feature_names": ["f"],
            "label_names": ["rock"],
            "features": {"n_rows": 3, "n_cols": 1, "values": [0.1, 0.2, 0.3]},
            "labels": {"n_rows": 3, "n_labels": 1, "values": [true, true, false]}
        }"#;
        assert!(serde_json::from_str::<Dataset>(mismatched_rows).is_err());
    }

    #[test]
    fn test_non_finite_features_rejected() {
        let features = FeatureMatrix::from_rows(&[vec![f64::NAN]]).unwrap();
        let labels = LabelMatrix::from_rows(&[vec![true]]).unwrap();
        let err = Dataset::new(
            vec!["a".into()],
            vec!["f".into()],
            vec!["rock".into()],
            features,
            labels,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_split_rejects_bad_k() {
        let dataset = toy_dataset();
        assert!(matches!(dataset.split(1, 0), Err(Error::InvalidInput(_))));
        assert!(matches!(dataset.split(13, 0), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_split_insufficient_label_support() {
        // jazz occurs 4 times (0, 3, 6, 9)
        let dataset = toy_dataset();
        let err = dataset.split(5, 0).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientSamples { ref label, support: 4, required: 5 } if label == "jazz"
        ));
    }

    #[test]
    fn test_train_test_split_sizes() {
        let dataset = toy_dataset();
        let fold = dataset.train_test_split(0.25, 7).unwrap();
        assert_eq!(fold.test().len(), 3);
        assert_eq!(fold.train().len(), 9);
        fold.validate(12).unwrap();
        assert!(dataset.train_test_split(1.0, 7).is_err());
        assert!(dataset.train_test_split(0.01, 7).is_err());
    }

    #[test]
    fn test_fold_validate_detects_overlap() {
        let fold = FoldAssignment {
            fold: 0,
            train: vec![0, 1],
            test: vec![1, 2],
        };
        assert!(matches!(fold.validate(3), Err(Error::InvalidFold(_))));
    }

    #[test]
    fn test_fold_characteristics() {
        let dataset = toy_dataset();
        let folds = dataset.split(3, 1).unwrap();
        let chars = dataset.fold_characteristics(&folds[2], 1);
        assert_eq!(chars.fold, Some(2));
        assert_eq!(chars.n_test_examples, Some(4));
        assert_eq!(chars.n_train_examples, Some(8));
        assert_eq!(chars.label_support, vec![6, 4]);
    }
}
