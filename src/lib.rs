//! # genre-cv: Multi-Label Cross-Validation for Genre Classification
//!
//! **Version**: 0.1.0
//!
//! genre-cv partitions multi-label datasets into label-balanced folds,
//! evaluates estimator configurations across those folds with per-fold
//! failure isolation, and aggregates the per-fold metrics into mean and
//! standard deviation per label and overall.
//!
//! ## Design Principles
//!
//! - **Stratified splits**: iterative stratification keeps every label,
//!   rarest first, spread across folds
//! - **Isolation**: an estimator failing on one fold yields sentinel
//!   records; the rest of the run continues
//! - **Transparency**: aggregates report how many folds were excluded
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use genre_cv::cv::{CrossValidationRunner, MetricsAggregator, RunnerConfig, SummaryTable};
//! use genre_cv::dataset::Dataset;
//! use genre_cv::estimator::EstimatorConfig;
//!
//! let dataset = Dataset::from_parquet(
//!     "data/tracks.parquet",
//!     "track_id",
//!     &["energy", "tempo", "valence"],
//!     &["rock", "jazz", "electronic"],
//! )?;
//!
//! let configs = EstimatorConfig::load_all("configs/baselines.json")?;
//! let runner = CrossValidationRunner::new(RunnerConfig::default());
//! let run = runner.run(&dataset, &configs, 5, 42)?;
//!
//! let summaries = MetricsAggregator::aggregate(run.records())?;
//! println!("{}", SummaryTable::new(&summaries));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod cv;
pub mod dataset;
pub mod error;
pub mod estimator;
pub mod experiment;
pub mod metrics;
pub mod scaling;
pub mod storage;

pub use error::{Error, Result};
