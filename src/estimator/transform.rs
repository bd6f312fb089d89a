//! Problem transformations: multi-label estimators built from a binary base learner

use super::{check_fit_shapes, BinaryClassifier, MultiLabelEstimator};
use crate::dataset::{FeatureMatrix, LabelMatrix};
use crate::{Error, Result};

fn not_fitted(kind: &str) -> Error {
    Error::EstimatorFit(format!("{kind} used before fit"))
}

/// One independent binary classifier per label.
#[derive(Debug)]
pub struct BinaryRelevance {
    base: Box<dyn BinaryClassifier>,
    models: Vec<Box<dyn BinaryClassifier>>,
}

impl BinaryRelevance {
    /// Wrap a base learner; it is cloned unfitted for every label.
    #[must_use]
    pub fn new(base: Box<dyn BinaryClassifier>) -> Self {
        Self {
            base,
            models: Vec::new(),
        }
    }
}

impl MultiLabelEstimator for BinaryRelevance {
    fn kind(&self) -> &'static str {
        "BinaryRelevance"
    }

    fn fit(&mut self, features: &FeatureMatrix, labels: &LabelMatrix) -> Result<()> {
        check_fit_shapes(features, labels.n_rows())?;
        self.models = (0..labels.n_labels())
            .map(|j| {
                let mut model = self.base.fresh();
                model.fit(features, &labels.column(j))?;
                Ok(model)
            })
            .collect::<Result<_>>()?;
        Ok(())
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<LabelMatrix> {
        if self.models.is_empty() {
            return Err(not_fitted(self.kind()));
        }
        let columns = self
            .models
            .iter()
            .map(|model| model.predict(features))
            .collect::<Result<Vec<_>>>()?;
        LabelMatrix::from_columns(&columns, features.n_rows())
    }
}

/// Binary classifiers in label order, each seeing the earlier labels as
/// extra features: true labels while fitting, its predecessors' predictions
/// while predicting.
#[derive(Debug)]
pub struct ClassifierChain {
    base: Box<dyn BinaryClassifier>,
    models: Vec<Box<dyn BinaryClassifier>>,
}

impl ClassifierChain {
    /// Wrap a base learner; it is cloned unfitted for every link.
    #[must_use]
    pub fn new(base: Box<dyn BinaryClassifier>) -> Self {
        Self {
            base,
            models: Vec::new(),
        }
    }
}

impl MultiLabelEstimator for ClassifierChain {
    fn kind(&self) -> &'static str {
        "ClassifierChain"
    }

    fn fit(&mut self, features: &FeatureMatrix, labels: &LabelMatrix) -> Result<()> {
        check_fit_shapes(features, labels.n_rows())?;
        let columns: Vec<Vec<bool>> = (0..labels.n_labels()).map(|j| labels.column(j)).collect();

        let mut models = Vec::with_capacity(columns.len());
        for (j, target) in columns.iter().enumerate() {
            let augmented = features.hstack_indicators(&columns[..j])?;
            let mut model = self.base.fresh();
            model.fit(&augmented, target)?;
            models.push(model);
        }
        self.models = models;
        Ok(())
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<LabelMatrix> {
        if self.models.is_empty() {
            return Err(not_fitted(self.kind()));
        }
        let mut predicted: Vec<Vec<bool>> = Vec::with_capacity(self.models.len());
        for model in &self.models {
            let augmented = features.hstack_indicators(&predicted)?;
            predicted.push(model.predict(&augmented)?);
        }
        LabelMatrix::from_columns(&predicted, features.n_rows())
    }
}

/// Treats every distinct label combination seen in training as one class and
/// picks the most probable class, one-vs-rest.
#[derive(Debug)]
pub struct LabelPowerset {
    base: Box<dyn BinaryClassifier>,
    classes: Vec<Vec<bool>>,
    models: Vec<Box<dyn BinaryClassifier>>,
}

impl LabelPowerset {
    /// Wrap a base learner; it is cloned unfitted for every combination.
    #[must_use]
    pub fn new(base: Box<dyn BinaryClassifier>) -> Self {
        Self {
            base,
            classes: Vec::new(),
            models: Vec::new(),
        }
    }

    /// Label combinations seen during fit, in first-appearance order.
    #[must_use]
    pub fn classes(&self) -> &[Vec<bool>] {
        &self.classes
    }
}

impl MultiLabelEstimator for LabelPowerset {
    fn kind(&self) -> &'static str {
        "LabelPowerset"
    }

    fn fit(&mut self, features: &FeatureMatrix, labels: &LabelMatrix) -> Result<()> {
        check_fit_shapes(features, labels.n_rows())?;

        let mut classes: Vec<Vec<bool>> = Vec::new();
        let mut class_of = Vec::with_capacity(labels.n_rows());
        for row in labels.rows() {
            let class = match classes.iter().position(|c| c == row) {
                Some(class) => class,
                None => {
                    classes.push(row.to_vec());
                    classes.len() - 1
                }
            };
            class_of.push(class);
        }

        let models = (0..classes.len())
            .map(|c| {
                let targets: Vec<bool> = class_of.iter().map(|&k| k == c).collect();
                let mut model = self.base.fresh();
                model.fit(features, &targets)?;
                Ok(model)
            })
            .collect::<Result<_>>()?;

        self.classes = classes;
        self.models = models;
        Ok(())
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<LabelMatrix> {
        let n_labels = self
            .classes
            .first()
            .map(Vec::len)
            .ok_or_else(|| not_fitted(self.kind()))?;
        let scores = self
            .models
            .iter()
            .map(|model| model.predict_proba(features))
            .collect::<Result<Vec<_>>>()?;

        let mut values = Vec::with_capacity(features.n_rows() * n_labels);
        for i in 0..features.n_rows() {
            let mut best = 0;
            for (c, column) in scores.iter().enumerate().skip(1) {
                if column[i] > scores[best][i] {
                    best = c;
                }
            }
            values.extend_from_slice(&self.classes[best]);
        }
        LabelMatrix::new(features.n_rows(), n_labels, values)
    }
}
