//! Trainer configuration.
//!
//! Loaded from a JSON settings file or built in code with the `with_*`
//! methods. Call [`TrainerConfig::build`] (or `validate`) before use.
//!
//! ```json
//! {
//!     "env_name": "CartPole-v0",
//!     "batch_size": 5000,
//!     "iterations": 500000,
//!     "hidden_dim": 32,
//!     "lr": 0.01,
//!     "gamma": 0.99,
//!     "lambda": 0.97
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::algorithms::AdvantageEstimator;
use crate::environment::SUPPORTED_ENVS;

/// Configuration validation and loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A count parameter must be positive.
    #[error("{field} must be > 0, got {value}")]
    InvalidCount { field: &'static str, value: usize },
    /// A parameter is outside its valid range.
    #[error("{field} must be in [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("unknown environment {0:?}")]
    UnknownEnvironment(String),
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// What happens to the environment when a full batch cuts an episode short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TruncationPolicy {
    /// Keep the environment running; the episode continues into the next batch.
    #[default]
    Continue,
    /// Reset the environment so every batch starts on a fresh episode.
    Reset,
}

/// Settings for one training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Registered environment name.
    pub env_name: String,
    /// Steps per training batch; also the buffer capacity.
    pub batch_size: usize,
    /// Total environment steps to run.
    pub iterations: usize,
    /// Units per hidden layer in both networks.
    #[serde(alias = "hidden_size")]
    pub hidden_dim: usize,
    /// Peak learning rate.
    pub lr: f64,
    /// Discount factor.
    pub gamma: f32,
    /// GAE λ. Plain bootstrapped returns are used when absent.
    #[serde(alias = "gae_lambda")]
    pub lambda: Option<f32>,
    /// Length of the one-cycle LR schedule in updates. Constant LR when absent.
    pub cycle_steps: Option<usize>,
    pub seed: u64,
    /// Normalize advantages across the batch before the update.
    pub normalize_advantages: bool,
    pub truncation: TruncationPolicy,
    /// Optional CSV metrics file.
    pub csv_path: Option<PathBuf>,
    /// Batches between console lines.
    pub log_interval: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            env_name: "CartPole-v0".to_string(),
            batch_size: 5000,
            iterations: 500_000,
            hidden_dim: 32,
            lr: 1e-2,
            gamma: 0.99,
            lambda: Some(0.97),
            cycle_steps: None,
            seed: 0,
            normalize_advantages: false,
            truncation: TruncationPolicy::Continue,
            csv_path: None,
            log_interval: 1,
        }
    }
}

impl TrainerConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse settings from a JSON string. Missing keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON settings file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Advantage estimator selected by `lambda`.
    pub fn estimator(&self) -> AdvantageEstimator {
        AdvantageEstimator::from_lambda(self.lambda)
    }

    /// Number of learner updates the run will perform.
    pub fn num_updates(&self) -> usize {
        if self.batch_size == 0 {
            0
        } else {
            self.iterations / self.batch_size
        }
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !SUPPORTED_ENVS.contains(&self.env_name.as_str()) {
            return Err(ConfigError::UnknownEnvironment(self.env_name.clone()));
        }

        for (field, value) in [
            ("batch_size", self.batch_size),
            ("iterations", self.iterations),
            ("hidden_dim", self.hidden_dim),
            ("log_interval", self.log_interval),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidCount { field, value });
            }
        }
        if self.cycle_steps == Some(0) {
            return Err(ConfigError::InvalidCount {
                field: "cycle_steps",
                value: 0,
            });
        }

        if !self.lr.is_finite() || self.lr <= 0.0 || self.lr > 1.0 {
            return Err(ConfigError::OutOfRange {
                field: "lr",
                value: self.lr,
                min: 0.0,
                max: 1.0,
            });
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(ConfigError::OutOfRange {
                field: "gamma",
                value: self.gamma as f64,
                min: 0.0,
                max: 1.0,
            });
        }
        if let Some(lambda) = self.lambda {
            if !(0.0..=1.0).contains(&lambda) {
                return Err(ConfigError::OutOfRange {
                    field: "lambda",
                    value: lambda as f64,
                    min: 0.0,
                    max: 1.0,
                });
            }
        }

        Ok(())
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<Self, ConfigError> {
        self.validate()?;
        Ok(self)
    }

    pub fn with_env_name(mut self, name: impl Into<String>) -> Self {
        self.env_name = name.into();
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_hidden_dim(mut self, hidden_dim: usize) -> Self {
        self.hidden_dim = hidden_dim;
        self
    }

    pub fn with_lr(mut self, lr: f64) -> Self {
        self.lr = lr;
        self
    }

    /// Set discount factor (gamma).
    pub fn with_gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    /// Set GAE λ; `None` selects plain bootstrapped returns.
    pub fn with_lambda(mut self, lambda: Option<f32>) -> Self {
        self.lambda = lambda;
        self
    }

    pub fn with_cycle_steps(mut self, cycle_steps: Option<usize>) -> Self {
        self.cycle_steps = cycle_steps;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_normalize_advantages(mut self, normalize: bool) -> Self {
        self.normalize_advantages = normalize;
        self
    }

    pub fn with_truncation(mut self, policy: TruncationPolicy) -> Self {
        self.truncation = policy;
        self
    }

    pub fn with_csv_path(mut self, path: Option<PathBuf>) -> Self {
        self.csv_path = path;
        self
    }

    pub fn with_log_interval(mut self, batches: usize) -> Self {
        self.log_interval = batches;
        self
    }
}
