//! Top-level training error.

use thiserror::Error;

use crate::buffers::BufferError;
use crate::config::ConfigError;
use crate::environment::EnvError;
use crate::learner::LearnerError;

/// Any failure that stops a training run.
///
/// Buffer errors indicate a scheduling defect; environment and learner
/// errors are passed through unchanged.
#[derive(Debug, Error)]
pub enum TrainError {
    #[error("trajectory buffer: {0}")]
    Buffer(#[from] BufferError),
    #[error("environment: {0}")]
    Env(#[from] EnvError),
    #[error("learner: {0}")]
    Learner(#[from] LearnerError),
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("environment has {env} observation values, buffer was built for {buffer}")]
    ObservationSize { env: usize, buffer: usize },
}
