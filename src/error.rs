//! Error types for genre-cv
//!
//! Structural violations (bad indices, unsupported fold counts, rare labels)
//! abort the call that hit them. Estimator failures during a cross-validation
//! run never surface here: the runner records them as sentinel outcomes.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// genre-cv error types
#[derive(Error, Debug)]
pub enum Error {
    /// A label occurs too rarely to appear in every fold
    #[error("Insufficient samples: label '{label}' occurs {support} times, at least {required} required\nReduce the number of folds or drop the label")]
    InsufficientSamples {
        /// Label name
        label: String,
        /// Number of positive samples for the label
        support: usize,
        /// Minimum number of positive samples required
        required: usize,
    },

    /// Row index outside the dataset
    #[error("Index {index} out of range (dataset has {len} samples)")]
    IndexOutOfRange {
        /// Offending index
        index: usize,
        /// Number of samples
        len: usize,
    },

    /// Estimator could not be fitted or could not predict
    #[error("Estimator fit failed: {0}")]
    EstimatorFit(String),

    /// Operation over an empty collection
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Invalid argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Fold assignment violates the partition invariant (leakage or gaps)
    #[error("Invalid fold assignment: {0}")]
    InvalidFold(String),

    /// Two samples share the same identifier
    #[error("Duplicate sample id: {0}")]
    DuplicateSampleId(String),

    /// Matrix dimensions disagree
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Expected shape
        expected: String,
        /// Actual shape
        actual: String,
    },

    /// Requested columns are absent from the input table
    #[error("Input data is missing columns: {0:?}")]
    MissingColumns(Vec<String>),

    /// No estimator factory registered for the model type
    #[error("Unknown model type: {0}\nRegister a factory with EstimatorRegistry::register")]
    UnknownModelType(String),

    /// Storage error (Parquet/Arrow ingestion, experiment files)
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}
