//! Vanilla policy gradient learner on burn.

use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{Adam, AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::activation::{log_softmax, softmax};
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::{ElementConversion, TensorData};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::model::{ActorCriticConfig, PolicyNet, ValueNet};
use super::{ActorCritic, LearnerError, UpdateStats};
use crate::algorithms::{normalize_advantages, policy_gradient_loss, value_loss};
use crate::buffers::TrajectoryBatch;
use crate::scheduling::LrScheduler;

/// Pick an action from a probability vector with one uniform draw in [0, 1).
///
/// Falls back to the last action when rounding leaves the cumulative sum
/// just below `u`.
pub fn sample_categorical(probs: &[f32], u: f32) -> u32 {
    let mut cumsum = 0.0;
    for (a, p) in probs.iter().enumerate() {
        cumsum += p;
        if u < cumsum {
            return a as u32;
        }
    }
    probs.len().saturating_sub(1) as u32
}

fn readback<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Result<Vec<f32>, LearnerError> {
    tensor
        .into_data()
        .to_vec::<f32>()
        .map_err(|err| LearnerError::Tensor(format!("{:?}", err)))
}

/// Actor and critic trained with separate optimizers.
///
/// The actor minimizes `-mean(log π(a|s) · A)`, the critic minimizes
/// `mean((V(s) - R)^2)`. Both step with the learning rate the scheduler
/// gives for the current update index.
pub struct VpgLearner<B, OP, OV>
where
    B: AutodiffBackend,
    OP: Optimizer<PolicyNet<B>, B>,
    OV: Optimizer<ValueNet<B>, B>,
{
    policy: PolicyNet<B>,
    value_net: ValueNet<B>,
    policy_optim: OP,
    value_optim: OV,
    scheduler: Box<dyn LrScheduler>,
    config: ActorCriticConfig,
    normalize_advantages: bool,
    updates: usize,
    rng: StdRng,
    device: B::Device,
}

/// [`VpgLearner`] with Adam on both networks.
pub type AdamVpgLearner<B> =
    VpgLearner<B, OptimizerAdaptor<Adam, PolicyNet<B>, B>, OptimizerAdaptor<Adam, ValueNet<B>, B>>;

impl<B: AutodiffBackend> AdamVpgLearner<B> {
    /// Learner with default Adam optimizers for both networks.
    pub fn with_adam(
        config: ActorCriticConfig,
        scheduler: Box<dyn LrScheduler>,
        seed: u64,
        device: B::Device,
    ) -> Self {
        Self::new(
            config,
            AdamConfig::new().init(),
            AdamConfig::new().init(),
            scheduler,
            seed,
            device,
        )
    }
}

impl<B, OP, OV> VpgLearner<B, OP, OV>
where
    B: AutodiffBackend,
    OP: Optimizer<PolicyNet<B>, B>,
    OV: Optimizer<ValueNet<B>, B>,
{
    pub fn new(
        config: ActorCriticConfig,
        policy_optim: OP,
        value_optim: OV,
        scheduler: Box<dyn LrScheduler>,
        seed: u64,
        device: B::Device,
    ) -> Self {
        Self {
            policy: config.init_policy(&device),
            value_net: config.init_value(&device),
            policy_optim,
            value_optim,
            scheduler,
            config,
            normalize_advantages: false,
            updates: 0,
            rng: StdRng::seed_from_u64(seed),
            device,
        }
    }

    /// Normalize advantages across the batch before each update.
    pub fn with_normalized_advantages(mut self, normalize: bool) -> Self {
        self.normalize_advantages = normalize;
        self
    }

    pub fn config(&self) -> &ActorCriticConfig {
        &self.config
    }

    /// Updates performed so far.
    pub fn updates(&self) -> usize {
        self.updates
    }

    /// Action probabilities π(·|observation).
    pub fn action_probs(&self, observation: &[f32]) -> Result<Vec<f32>, LearnerError> {
        let obs = self.observation_tensor(observation)?;
        readback(softmax(self.policy.forward(obs), 1))
    }

    fn observation_tensor(&self, observation: &[f32]) -> Result<Tensor<B, 2>, LearnerError> {
        if observation.len() != self.config.obs_size {
            return Err(LearnerError::ObservationSize {
                expected: self.config.obs_size,
                got: observation.len(),
            });
        }
        Ok(Tensor::from_data(
            TensorData::new(observation.to_vec(), [1, self.config.obs_size]),
            &self.device,
        ))
    }

    fn batch_tensors(
        &self,
        batch: &TrajectoryBatch,
    ) -> Result<(Tensor<B, 2>, Tensor<B, 2, Int>, Tensor<B, 1>, Tensor<B, 1>), LearnerError> {
        let n = batch.len();
        if n == 0 {
            return Err(LearnerError::EmptyBatch);
        }
        if batch.obs_size != self.config.obs_size {
            return Err(LearnerError::ObservationSize {
                expected: self.config.obs_size,
                got: batch.obs_size,
            });
        }

        let mut advantages = batch.advantages.clone();
        if self.normalize_advantages {
            normalize_advantages(&mut advantages);
        }
        let actions: Vec<i64> = batch.actions.iter().map(|&a| a as i64).collect();

        let observations = Tensor::from_data(
            TensorData::new(batch.observations.clone(), [n, batch.obs_size]),
            &self.device,
        );
        let actions = Tensor::from_data(TensorData::new(actions, [n, 1]), &self.device);
        let advantages = Tensor::from_data(TensorData::new(advantages, [n]), &self.device);
        let returns = Tensor::from_data(
            TensorData::new(batch.returns_to_go.clone(), [n]),
            &self.device,
        );

        Ok((observations, actions, advantages, returns))
    }
}

impl<B, OP, OV> ActorCritic for VpgLearner<B, OP, OV>
where
    B: AutodiffBackend,
    OP: Optimizer<PolicyNet<B>, B>,
    OV: Optimizer<ValueNet<B>, B>,
{
    fn act(&mut self, observation: &[f32]) -> Result<(u32, f32), LearnerError> {
        let probs = self.action_probs(observation)?;
        let action = sample_categorical(&probs, self.rng.gen::<f32>());
        let value = self.value(observation)?;
        Ok((action, value))
    }

    fn value(&self, observation: &[f32]) -> Result<f32, LearnerError> {
        let obs = self.observation_tensor(observation)?;
        let value: f32 = self.value_net.forward(obs).into_scalar().elem();
        if !value.is_finite() {
            return Err(LearnerError::NonFinite { what: "value estimate" });
        }
        Ok(value)
    }

    fn update(&mut self, batch: &TrajectoryBatch) -> Result<UpdateStats, LearnerError> {
        let (observations, actions, advantages, returns) = self.batch_tensors(batch)?;
        let lr = self.scheduler.get_lr(self.updates);

        let logits = self.policy.forward(observations.clone());
        let log_probs: Tensor<B, 1> = log_softmax(logits, 1).gather(1, actions).flatten(0, 1);
        let policy_loss = policy_gradient_loss(log_probs, advantages);
        let values = self.value_net.forward(observations);
        let critic_loss = value_loss(values, returns);

        // Both losses are checked before either network moves, so a rejected
        // batch leaves the learner as it was.
        let policy_loss_val: f32 = policy_loss.clone().into_scalar().elem();
        if !policy_loss_val.is_finite() {
            return Err(LearnerError::NonFinite { what: "policy loss" });
        }
        let value_loss_val: f32 = critic_loss.clone().into_scalar().elem();
        if !value_loss_val.is_finite() {
            return Err(LearnerError::NonFinite { what: "value loss" });
        }

        // Actor
        let grads = policy_loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.policy);
        self.policy = self.policy_optim.step(lr, self.policy.clone(), grads);

        // Critic
        let grads = critic_loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.value_net);
        self.value_net = self.value_optim.step(lr, self.value_net.clone(), grads);

        self.updates += 1;
        debug!(
            update = self.updates,
            policy_loss = policy_loss_val,
            value_loss = value_loss_val,
            lr,
            "learner update"
        );

        Ok(UpdateStats {
            policy_loss: policy_loss_val,
            value_loss: value_loss_val,
            learning_rate: lr,
        })
    }
}
