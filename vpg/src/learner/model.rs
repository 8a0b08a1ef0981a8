//! Actor and critic networks.

use burn::nn::{Linear, LinearConfig};
use burn::prelude::*;
use burn::tensor::activation::relu;

/// Network shapes shared by actor and critic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorCriticConfig {
    pub obs_size: usize,
    pub n_actions: usize,
    /// Units in each of the two hidden layers.
    pub hidden_dim: usize,
}

impl ActorCriticConfig {
    pub fn new(obs_size: usize, n_actions: usize, hidden_dim: usize) -> Self {
        Self {
            obs_size,
            n_actions,
            hidden_dim,
        }
    }

    /// Initialize the policy network.
    pub fn init_policy<B: Backend>(&self, device: &B::Device) -> PolicyNet<B> {
        PolicyNet {
            fc1: LinearConfig::new(self.obs_size, self.hidden_dim).init(device),
            fc2: LinearConfig::new(self.hidden_dim, self.hidden_dim).init(device),
            head: LinearConfig::new(self.hidden_dim, self.n_actions).init(device),
        }
    }

    /// Initialize the value network.
    pub fn init_value<B: Backend>(&self, device: &B::Device) -> ValueNet<B> {
        ValueNet {
            fc1: LinearConfig::new(self.obs_size, self.hidden_dim).init(device),
            fc2: LinearConfig::new(self.hidden_dim, self.hidden_dim).init(device),
            head: LinearConfig::new(self.hidden_dim, 1).init(device),
        }
    }
}

/// Policy network: observations → action logits.
#[derive(Module, Debug)]
pub struct PolicyNet<B: Backend> {
    fc1: Linear<B>,
    fc2: Linear<B>,
    head: Linear<B>,
}

impl<B: Backend> PolicyNet<B> {
    /// `[batch, obs_size]` → `[batch, n_actions]`
    pub fn forward(&self, obs: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = relu(self.fc1.forward(obs));
        let x = relu(self.fc2.forward(x));
        self.head.forward(x)
    }
}

/// Value network: observations → V(s).
#[derive(Module, Debug)]
pub struct ValueNet<B: Backend> {
    fc1: Linear<B>,
    fc2: Linear<B>,
    head: Linear<B>,
}

impl<B: Backend> ValueNet<B> {
    /// `[batch, obs_size]` → `[batch]`
    pub fn forward(&self, obs: Tensor<B, 2>) -> Tensor<B, 1> {
        let x = relu(self.fc1.forward(obs));
        let x = relu(self.fc2.forward(x));
        self.head.forward(x).flatten(0, 1)
    }
}
