//! Training configuration.
//!
//! Every trainer reads its hyperparameters from a [`TrainingConfig`]. The structs
//! are serde-(de)serializable with `#[serde(default)]` on every level, so a JSON
//! config file only needs to mention the values it overrides.

use std::fs;
use std::path::Path;

use log::Level;
use serde::{Deserialize, Serialize};

use crate::error::{CodelangError, Result};
use crate::svm::Kernel;

/// Default fraction of each language's samples held out for model selection.
pub const DEFAULT_CROSS_VALIDATION_FRACTION: f64 = 0.3;

/// Configuration shared by all trainers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrainingConfig {
    /// Seed for every random shuffle and weight initialization.
    pub seed: u64,
    /// Log per-candidate progress at info level instead of debug level.
    pub verbose: bool,
    /// Fraction of each language's samples held out for model selection.
    pub cross_validation_fraction: f64,
    /// K-nearest-neighbors settings.
    pub knn: KnnConfig,
    /// Support vector machine settings.
    pub svm: SvmConfig,
    /// Neural network settings.
    pub neuralnet: NeuralNetConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            verbose: false,
            cross_validation_fraction: DEFAULT_CROSS_VALIDATION_FRACTION,
            knn: KnnConfig::default(),
            svm: SvmConfig::default(),
            neuralnet: NeuralNetConfig::default(),
        }
    }
}

impl TrainingConfig {
    /// Load a configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path)?;
        let config: Self = serde_json::from_slice(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Log level for per-candidate training progress.
    pub fn progress_level(&self) -> Level {
        if self.verbose { Level::Info } else { Level::Debug }
    }

    /// Check that every parameter is usable.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.cross_validation_fraction) {
            return Err(CodelangError::invalid_config(format!(
                "cross validation fraction must be in [0, 1), got {}",
                self.cross_validation_fraction
            )));
        }
        self.svm.validate()?;
        self.neuralnet.validate()
    }
}

/// How neighbors vote in the K-nearest-neighbors classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NeighborWeighting {
    /// Each neighbor votes with its cosine similarity.
    #[default]
    Similarity,
    /// Each neighbor votes with `1 / (1 - similarity)`.
    InverseDistance,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KnnConfig {
    pub weighting: NeighborWeighting,
}

/// Support vector machine training parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SvmConfig {
    /// Kernels to try; the one with the best held-out accuracy is kept.
    pub kernels: Vec<Kernel>,
    /// Tradeoff between margin size and hinge loss.
    pub tradeoff: f64,
    /// Maximum number of passes over the samples per binary problem.
    pub max_passes: usize,
    /// Stop once no coordinate violates optimality by more than this.
    pub tolerance: f64,
}

impl Default for SvmConfig {
    fn default() -> Self {
        Self {
            kernels: Kernel::default_candidates(),
            tradeoff: 0.001,
            max_passes: 1000,
            tolerance: 1e-4,
        }
    }
}

impl SvmConfig {
    pub fn validate(&self) -> Result<()> {
        if self.kernels.is_empty() {
            return Err(CodelangError::invalid_config("at least one kernel is required"));
        }
        if !(self.tradeoff > 0.0 && self.tradeoff.is_finite()) {
            return Err(CodelangError::invalid_config(format!(
                "tradeoff must be positive, got {}",
                self.tradeoff
            )));
        }
        if !(self.tolerance > 0.0) {
            return Err(CodelangError::invalid_config("tolerance must be positive"));
        }
        Ok(())
    }
}

/// Neural network training parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NeuralNetConfig {
    /// Step sizes to try, each from a fresh initialization.
    pub step_sizes: Vec<f64>,
    /// Upper bound on training epochs per step size.
    pub max_iterations: usize,
    /// Epochs to run before early stopping kicks in.
    pub initial_iterations: usize,
    /// Hidden units per output unit when `hidden_size` is unset.
    pub hidden_layer_scale: f64,
    /// Explicit hidden layer size.
    pub hidden_size: Option<usize>,
    /// Scale every gradient to unit length before stepping.
    pub normalize_gradients: bool,
    /// Standardize each input feature using training statistics.
    pub standardize_inputs: bool,
}

impl Default for NeuralNetConfig {
    fn default() -> Self {
        Self {
            step_sizes: (-20..10).map(|p| 2f64.powi(p)).collect(),
            max_iterations: 6400,
            initial_iterations: 100,
            hidden_layer_scale: 2.0,
            hidden_size: None,
            normalize_gradients: true,
            standardize_inputs: true,
        }
    }
}

impl NeuralNetConfig {
    pub fn validate(&self) -> Result<()> {
        if self.step_sizes.is_empty() {
            return Err(CodelangError::invalid_config("at least one step size is required"));
        }
        if self.step_sizes.iter().any(|s| s.is_nan() || *s <= 0.0) {
            return Err(CodelangError::invalid_config("step sizes must be positive"));
        }
        if !(self.hidden_layer_scale > 0.0) {
            return Err(CodelangError::invalid_config(
                "hidden layer scale must be positive",
            ));
        }
        if self.hidden_size == Some(0) {
            return Err(CodelangError::invalid_config("hidden size must be nonzero"));
        }
        Ok(())
    }

    /// Hidden layer size for a network with `outputs` output units.
    pub fn hidden_units(&self, outputs: usize) -> usize {
        self.hidden_size
            .unwrap_or_else(|| (self.hidden_layer_scale * outputs as f64).round() as usize)
            .max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrainingConfig::default();
        assert_eq!(config.cross_validation_fraction, 0.3);
        assert_eq!(config.neuralnet.step_sizes.len(), 30);
        assert_eq!(config.neuralnet.step_sizes[0], 2f64.powi(-20));
        assert_eq!(config.neuralnet.step_sizes[29], 512.0);
        assert_eq!(config.neuralnet.hidden_units(3), 6);
        assert_eq!(config.svm.kernels.len(), 11);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let json = r#"{"seed": 7, "neuralnet": {"maxIterations": 10, "hiddenSize": 4}}"#;
        let config: TrainingConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.neuralnet.max_iterations, 10);
        assert_eq!(config.neuralnet.hidden_units(2), 4);
        assert_eq!(config.neuralnet.initial_iterations, 100);
        assert_eq!(config.svm, SvmConfig::default());
    }

    #[test]
    fn test_validation() {
        let mut config = TrainingConfig::default();
        config.cross_validation_fraction = 1.0;
        assert!(matches!(
            config.validate(),
            Err(CodelangError::InvalidConfig(_))
        ));

        let mut config = TrainingConfig::default();
        config.svm.tradeoff = 0.0;
        assert!(config.validate().is_err());

        let mut config = TrainingConfig::default();
        config.neuralnet.step_sizes.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"knn": {"weighting": "inverseDistance"}}"#).unwrap();

        let config = TrainingConfig::from_file(&path).unwrap();
        assert_eq!(config.knn.weighting, NeighborWeighting::InverseDistance);
    }
}
