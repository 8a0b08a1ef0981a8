//! Advantage estimation and policy gradient losses.
//!
//! - [`returns`]: discounted cumulative sums and rewards-to-go
//! - [`gae`]: the [`AdvantageEstimator`] choice (plain returns or GAE)
//! - [`policy_loss`]: surrogate and critic losses for the update step

pub mod gae;
pub mod policy_loss;
pub mod returns;

pub use gae::{normalize_advantages, td_residuals, AdvantageEstimator, EpisodeTargets};
pub use policy_loss::{
    policy_gradient_loss, policy_gradient_loss_scalar, value_loss, value_loss_scalar,
};
pub use returns::{bootstrapped_rewards_to_go, discounted_cumsum, rewards_to_go};
