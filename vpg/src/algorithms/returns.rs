//! Discounted returns.
//!
//! Both rewards-to-go and GAE are the same backward recurrence
//! `y_t = x_t + d * y_{t+1}` applied to different inputs, so it lives here once.

/// Discounted cumulative sum from the end of `xs`.
///
/// `tail` plays the role of `y_T`, the value just past the last element:
/// `y_{T-1} = x_{T-1} + discount * tail`, `y_t = x_t + discount * y_{t+1}`.
pub fn discounted_cumsum(xs: &[f32], discount: f32, tail: f32) -> Vec<f32> {
    let mut out = vec![0.0f32; xs.len()];
    let mut running = tail;

    for t in (0..xs.len()).rev() {
        running = xs[t] + discount * running;
        out[t] = running;
    }

    out
}

/// Rewards-to-go: `R_t = Σ_{k=t}^{T-1} γ^{k-t} r_k`.
///
/// Used as the critic's regression target.
pub fn rewards_to_go(rewards: &[f32], gamma: f32) -> Vec<f32> {
    discounted_cumsum(rewards, gamma, 0.0)
}

/// Rewards-to-go seeded with a value estimate past the end of the span.
///
/// `last_value` must be 0.0 for a terminated episode.
pub fn bootstrapped_rewards_to_go(rewards: &[f32], last_value: f32, gamma: f32) -> Vec<f32> {
    discounted_cumsum(rewards, gamma, last_value)
}
