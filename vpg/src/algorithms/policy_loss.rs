//! Vanilla policy gradient losses.
//!
//! Both losses come as a tensor version for backpropagation and a scalar
//! version for checks on plain slices.

use burn::tensor::{backend::Backend, Tensor};

/// Policy gradient surrogate loss.
///
/// L(θ) = -E[log π_θ(a_t|s_t) · A_t]
///
/// # Arguments
///
/// * `log_probs` - log π_θ(a|s) of the taken actions: [batch_size]
/// * `advantages` - advantage estimates (detached): [batch_size]
///
/// # Returns
///
/// Scalar loss tensor (1D, single element)
pub fn policy_gradient_loss<B: Backend>(
    log_probs: Tensor<B, 1>,
    advantages: Tensor<B, 1>,
) -> Tensor<B, 1> {
    -(log_probs * advantages).mean()
}

/// Scalar counterpart of [`policy_gradient_loss`].
pub fn policy_gradient_loss_scalar(log_probs: &[f32], advantages: &[f32]) -> f32 {
    let n = log_probs.len();
    assert_eq!(advantages.len(), n);

    if n == 0 {
        return 0.0;
    }

    let total: f32 = log_probs.iter().zip(advantages).map(|(lp, a)| lp * a).sum();
    -total / n as f32
}

/// Critic regression loss: mean squared error against rewards-to-go.
///
/// # Arguments
///
/// * `values` - V(s) predictions: [batch_size]
/// * `returns` - rewards-to-go targets: [batch_size]
pub fn value_loss<B: Backend>(values: Tensor<B, 1>, returns: Tensor<B, 1>) -> Tensor<B, 1> {
    (values - returns).powf_scalar(2.0).mean()
}

/// Scalar counterpart of [`value_loss`].
pub fn value_loss_scalar(values: &[f32], returns: &[f32]) -> f32 {
    let n = values.len();
    assert_eq!(returns.len(), n);

    if n == 0 {
        return 0.0;
    }

    values
        .iter()
        .zip(returns)
        .map(|(v, r)| (v - r).powi(2))
        .sum::<f32>()
        / n as f32
}
