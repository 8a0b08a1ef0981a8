//! Actor-critic learner.
//!
//! - [`ActorCritic`]: what the batch scheduler needs from a learner
//! - [`VpgLearner`]: burn implementation with separate actor and critic
//!   networks, each with its own optimizer

pub mod model;
pub mod vpg_learner;


use thiserror::Error;

use crate::buffers::TrajectoryBatch;

pub use model::{ActorCriticConfig, PolicyNet, ValueNet};
pub use vpg_learner::{sample_categorical, AdamVpgLearner, VpgLearner};

/// Learner failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LearnerError {
    #[error("observation has {got} values, network expects {expected}")]
    ObservationSize { expected: usize, got: usize },
    #[error("cannot update on an empty batch")]
    EmptyBatch,
    #[error("{what} is not finite")]
    NonFinite { what: &'static str },
    #[error("tensor readback failed: {0}")]
    Tensor(String),
}

/// Losses and learning rate of one update.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UpdateStats {
    pub policy_loss: f32,
    pub value_loss: f32,
    pub learning_rate: f64,
}

/// Policy and value function consumed by the batch scheduler.
pub trait ActorCritic {
    /// Sample an action for `observation` and return it with V(observation).
    fn act(&mut self, observation: &[f32]) -> Result<(u32, f32), LearnerError>;

    /// V(observation), used to bootstrap truncated episodes.
    fn value(&self, observation: &[f32]) -> Result<f32, LearnerError>;

    /// One synchronous gradient update on a full batch.
    fn update(&mut self, batch: &TrajectoryBatch) -> Result<UpdateStats, LearnerError>;
}
