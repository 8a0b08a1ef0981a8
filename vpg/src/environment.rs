//! Environment abstraction and the built-in CartPole task.
//!
//! The trainer talks to a single, unvectorized environment through
//! [`Environment`]. Observation size and action count are queried once and
//! passed by value to the buffer and the networks.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::config::ConfigError;

/// Environment failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnvError {
    #[error("action {action} out of range for {n_actions} actions")]
    InvalidAction { action: u32, n_actions: usize },
    #[error("episode is over; call reset before stepping again")]
    NeedsReset,
}

/// Auxiliary data for one step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepInfo {
    /// Steps taken since the last reset, including this one.
    pub steps: usize,
    /// The episode ended because the step limit was reached.
    pub time_limit: bool,
}

/// Result of one environment step.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvStep {
    pub observation: Vec<f32>,
    pub reward: f32,
    /// The episode is over and the environment must be reset.
    pub done: bool,
    pub info: StepInfo,
}

/// Single discrete-action environment.
pub trait Environment {
    /// Size of one observation vector.
    fn obs_size(&self) -> usize;

    /// Number of discrete actions.
    fn n_actions(&self) -> usize;

    /// Start a new episode and return its first observation.
    fn reset(&mut self) -> Result<Vec<f32>, EnvError>;

    /// Apply `action` and advance one step.
    fn step(&mut self, action: u32) -> Result<EnvStep, EnvError>;
}

impl<E: Environment + ?Sized> Environment for Box<E> {
    fn obs_size(&self) -> usize {
        (**self).obs_size()
    }

    fn n_actions(&self) -> usize {
        (**self).n_actions()
    }

    fn reset(&mut self) -> Result<Vec<f32>, EnvError> {
        (**self).reset()
    }

    fn step(&mut self, action: u32) -> Result<EnvStep, EnvError> {
        (**self).step(action)
    }
}

// ============================================================================
// CartPole
// ============================================================================

const GRAVITY: f32 = 9.8;
const CART_MASS: f32 = 1.0;
const POLE_MASS: f32 = 0.1;
const POLE_LENGTH: f32 = 0.5;
const FORCE_MAG: f32 = 10.0;
const DT: f32 = 0.02;
const X_THRESHOLD: f32 = 2.4;
const THETA_THRESHOLD: f32 = 12.0 * std::f32::consts::PI / 180.0;
const INIT_RANGE: f32 = 0.05;

/// Classic cart-pole balancing task.
///
/// Observation: `[x, x_dot, theta, theta_dot]`. Actions: 0 pushes left,
/// 1 pushes right. Every step pays 1.0, including the one that ends the
/// episode. The episode ends when the pole falls past 12 degrees, the cart
/// leaves the track, or `max_steps` is reached.
#[derive(Debug, Clone)]
pub struct CartPole {
    state: [f32; 4],
    steps: usize,
    max_steps: usize,
    done: bool,
    rng: StdRng,
}

impl CartPole {
    pub const OBS_SIZE: usize = 4;
    pub const N_ACTIONS: usize = 2;

    /// Create a cart-pole with a step limit and a seeded RNG for resets.
    pub fn new(max_steps: usize, seed: u64) -> Self {
        Self {
            state: [0.0; 4],
            steps: 0,
            max_steps,
            // Stepping before the first reset is rejected.
            done: true,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// `CartPole-v0`: 200-step limit.
    pub fn v0(seed: u64) -> Self {
        Self::new(200, seed)
    }

    /// `CartPole-v1`: 500-step limit.
    pub fn v1(seed: u64) -> Self {
        Self::new(500, seed)
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    pub fn state(&self) -> [f32; 4] {
        self.state
    }

    fn integrate(&mut self, action: u32) {
        let force = if action == 1 { FORCE_MAG } else { -FORCE_MAG };
        let [x, x_dot, theta, theta_dot] = self.state;

        let cos_theta = theta.cos();
        let sin_theta = theta.sin();

        let total_mass = CART_MASS + POLE_MASS;
        let pole_mass_length = POLE_MASS * POLE_LENGTH;

        let temp = (force + pole_mass_length * theta_dot * theta_dot * sin_theta) / total_mass;
        let denom = POLE_LENGTH * (4.0 / 3.0 - POLE_MASS * cos_theta * cos_theta / total_mass);
        let theta_acc = (GRAVITY * sin_theta - cos_theta * temp) / denom.max(1e-6);
        let x_acc = temp - pole_mass_length * theta_acc * cos_theta / total_mass;

        self.state = [
            x + DT * x_dot,
            x_dot + DT * x_acc,
            theta + DT * theta_dot,
            theta_dot + DT * theta_acc,
        ];
    }

    fn out_of_bounds(&self) -> bool {
        let [x, _, theta, _] = self.state;
        x.abs() > X_THRESHOLD || theta.abs() > THETA_THRESHOLD
    }
}

impl Environment for CartPole {
    fn obs_size(&self) -> usize {
        Self::OBS_SIZE
    }

    fn n_actions(&self) -> usize {
        Self::N_ACTIONS
    }

    fn reset(&mut self) -> Result<Vec<f32>, EnvError> {
        for s in self.state.iter_mut() {
            *s = self.rng.gen_range(-INIT_RANGE..INIT_RANGE);
        }
        self.steps = 0;
        self.done = false;
        Ok(self.state.to_vec())
    }

    fn step(&mut self, action: u32) -> Result<EnvStep, EnvError> {
        if action as usize >= Self::N_ACTIONS {
            return Err(EnvError::InvalidAction {
                action,
                n_actions: Self::N_ACTIONS,
            });
        }
        if self.done {
            return Err(EnvError::NeedsReset);
        }

        self.integrate(action);
        self.steps += 1;

        let failed = self.out_of_bounds();
        let time_limit = !failed && self.steps >= self.max_steps;
        self.done = failed || time_limit;

        Ok(EnvStep {
            observation: self.state.to_vec(),
            reward: 1.0,
            done: self.done,
            info: StepInfo {
                steps: self.steps,
                time_limit,
            },
        })
    }
}

/// Build an environment by its registered name.
pub fn make_env(name: &str, seed: u64) -> Result<Box<dyn Environment>, ConfigError> {
    match name {
        "CartPole-v0" => Ok(Box::new(CartPole::v0(seed))),
        "CartPole-v1" => Ok(Box::new(CartPole::v1(seed))),
        other => Err(ConfigError::UnknownEnvironment(other.to_string())),
    }
}

/// Names accepted by [`make_env`].
pub const SUPPORTED_ENVS: &[&str] = &["CartPole-v0", "CartPole-v1"];
