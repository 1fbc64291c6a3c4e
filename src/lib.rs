//! # codelang
//!
//! Programming-language identification for source files.
//!
//! ## Features
//!
//! - Token-frequency features extracted from raw source text
//! - Interchangeable classifiers: ID3 trees, K-nearest neighbors, Gaussian naive
//!   Bayes, one-vs-all kernel SVMs and feedforward neural networks
//! - JSON persistence for every trained classifier
//! - Parallel corpus loading, split search and rating

pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod gaussbayes;
pub mod holdout;
pub mod idtree;
pub mod knn;
pub mod neuralnet;
pub mod rater;
pub mod svm;
pub mod tokens;
pub mod util;

pub mod prelude {
    pub use crate::classifier::{Algorithm, Classifier};
    pub use crate::config::TrainingConfig;
    pub use crate::error::{CodelangError, Result};
    pub use crate::rater::{OverallRating, rate};
    pub use crate::tokens::{Frequencies, SampleCounts, SampleSet, count_tokens};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
