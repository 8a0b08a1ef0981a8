//! Advantage estimation for a finished episode span.
//!
//! Two estimators share one signature:
//! - `PlainReturns`: A_t = R^boot_t - V(s_t), the bootstrapped reward-to-go
//!   minus the baseline
//! - `Gae { lambda }`: generalized advantage estimation
//!
//! ## Formula
//!
//! A_t^GAE(γ,λ) = Σ_{l=0}^{T-t-1} (γλ)^l δ_{t+l}
//! where δ_t = r_t + γ V(s_{t+1}) - V(s_t) and V(s_T) = last_value
//!
//! λ = 1 reduces GAE to `PlainReturns`; λ = 0 gives one-step TD residuals.
//!
//! ## References
//!
//! - Schulman et al., "High-Dimensional Continuous Control Using
//!   Generalized Advantage Estimation" (2016)

use super::returns::{bootstrapped_rewards_to_go, discounted_cumsum, rewards_to_go};

/// Advantage estimator applied at every episode boundary.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AdvantageEstimator {
    /// Bootstrapped rewards-to-go minus the value baseline.
    #[default]
    PlainReturns,
    /// Generalized advantage estimation with the given λ.
    Gae { lambda: f32 },
}

/// Targets for one episode span, aligned with its steps.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeTargets {
    pub advantages: Vec<f32>,
    /// Unbootstrapped rewards-to-go, the critic's regression target.
    pub returns_to_go: Vec<f32>,
}

impl AdvantageEstimator {
    /// Pick GAE when a λ is configured, plain returns otherwise.
    pub fn from_lambda(lambda: Option<f32>) -> Self {
        match lambda {
            Some(lambda) => Self::Gae { lambda },
            None => Self::PlainReturns,
        }
    }

    /// Advantages for one span.
    ///
    /// `last_value` is V(s_T): exactly 0.0 when the episode terminated, the
    /// critic's estimate of the next observation when the batch cut it short.
    pub fn advantages(&self, rewards: &[f32], values: &[f32], last_value: f32, gamma: f32) -> Vec<f32> {
        assert_eq!(
            rewards.len(),
            values.len(),
            "rewards and values must cover the same span"
        );

        match *self {
            Self::PlainReturns => bootstrapped_rewards_to_go(rewards, last_value, gamma)
                .into_iter()
                .zip(values)
                .map(|(ret, v)| ret - v)
                .collect(),
            Self::Gae { lambda } => {
                let deltas = td_residuals(rewards, values, last_value, gamma);
                discounted_cumsum(&deltas, gamma * lambda, 0.0)
            }
        }
    }

    /// Advantages plus critic targets for one span.
    pub fn estimate(
        &self,
        rewards: &[f32],
        values: &[f32],
        last_value: f32,
        gamma: f32,
    ) -> EpisodeTargets {
        EpisodeTargets {
            advantages: self.advantages(rewards, values, last_value, gamma),
            returns_to_go: rewards_to_go(rewards, gamma),
        }
    }
}

/// TD residuals δ_t = r_t + γ V(s_{t+1}) - V(s_t), with V(s_T) = `last_value`.
pub fn td_residuals(rewards: &[f32], values: &[f32], last_value: f32, gamma: f32) -> Vec<f32> {
    let n = rewards.len();
    assert_eq!(values.len(), n);

    (0..n)
        .map(|t| {
            let next_value = if t + 1 < n { values[t + 1] } else { last_value };
            rewards[t] + gamma * next_value - values[t]
        })
        .collect()
}

/// Normalize advantages to zero mean and unit variance.
///
/// # Edge Cases
///
/// - Empty slice: no-op
/// - Single element: sets to 0.0 (can't compute meaningful variance)
/// - All same values: sets all to 0.0 (epsilon prevents NaN)
pub fn normalize_advantages(advantages: &mut [f32]) {
    if advantages.is_empty() {
        return;
    }

    if advantages.len() == 1 {
        advantages[0] = 0.0;
        return;
    }

    let n = advantages.len() as f32;
    let mean = advantages.iter().sum::<f32>() / n;
    let variance = advantages.iter().map(|a| (a - mean).powi(2)).sum::<f32>() / n;
    let std = (variance + 1e-8).sqrt();

    for a in advantages.iter_mut() {
        *a = (*a - mean) / std;
    }
}
