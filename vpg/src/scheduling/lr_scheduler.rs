//! Learning rate schedules.
//!
//! - `ConstantLr`: fixed learning rate
//! - `OneCycleLr`: cosine warm-up to a peak, then cosine anneal to a floor
//!
//! # Data Integrity
//!
//! Schedulers validate inputs in debug builds and sanitize them in release
//! builds so a bad setting cannot feed NaN into the optimizer:
//!
//! - Non-finite or negative learning rates trigger a debug panic and become 0.0
//! - `total_steps = 0` triggers a debug panic and is treated as 1
//! - Steps past the end of a cycle return the final learning rate

use std::f64::consts::PI;

/// Learning rate scheduler trait.
///
/// `step` counts learner updates, starting at 0.
pub trait LrScheduler: Send + Sync {
    /// Get the learning rate for a given update step.
    fn get_lr(&self, step: usize) -> f64;
}

fn sanitize_lr(lr: f64) -> f64 {
    if lr.is_finite() && lr >= 0.0 {
        lr
    } else {
        0.0
    }
}

/// Cosine interpolation from `start` (pct = 0) to `end` (pct = 1).
fn cosine_anneal(start: f64, end: f64, pct: f64) -> f64 {
    end + (start - end) / 2.0 * ((PI * pct).cos() + 1.0)
}

/// Constant learning rate (no scheduling).
#[derive(Debug, Clone)]
pub struct ConstantLr {
    lr: f64,
}

impl ConstantLr {
    /// Create a new constant LR scheduler.
    ///
    /// # Panics (debug only)
    ///
    /// Panics if `lr` is NaN, Inf, or negative.
    pub fn new(lr: f64) -> Self {
        debug_assert!(lr.is_finite(), "ConstantLr: lr must be finite, got {}", lr);
        debug_assert!(lr >= 0.0, "ConstantLr: lr must be non-negative, got {}", lr);

        Self {
            lr: sanitize_lr(lr),
        }
    }

    pub fn lr(&self) -> f64 {
        self.lr
    }
}

impl LrScheduler for ConstantLr {
    fn get_lr(&self, _step: usize) -> f64 {
        self.lr
    }
}

/// One-cycle learning rate policy.
///
/// Starts at `max_lr / div_factor`, rises along a cosine to `max_lr` over the
/// first `pct_start` of the cycle, then falls along a cosine to
/// `initial_lr / final_div_factor` at `total_steps - 1`.
///
/// Defaults: `pct_start = 0.3`, `div_factor = 25`, `final_div_factor = 1e4`.
#[derive(Debug, Clone)]
pub struct OneCycleLr {
    max_lr: f64,
    initial_lr: f64,
    min_lr: f64,
    total_steps: usize,
    warmup_end: f64,
}

impl OneCycleLr {
    /// Create a one-cycle schedule with the default shape.
    pub fn new(max_lr: f64, total_steps: usize) -> Self {
        Self::with_shape(max_lr, total_steps, 0.3, 25.0, 1e4)
    }

    /// Create a one-cycle schedule with an explicit shape.
    ///
    /// # Panics (debug only)
    ///
    /// Panics if `max_lr` is invalid, `total_steps` is 0, `pct_start` is
    /// outside `(0, 1)` or either divisor is not positive.
    pub fn with_shape(
        max_lr: f64,
        total_steps: usize,
        pct_start: f64,
        div_factor: f64,
        final_div_factor: f64,
    ) -> Self {
        debug_assert!(
            max_lr.is_finite() && max_lr >= 0.0,
            "OneCycleLr: max_lr must be finite and non-negative, got {}",
            max_lr
        );
        debug_assert!(total_steps > 0, "OneCycleLr: total_steps must be > 0");
        debug_assert!(
            pct_start > 0.0 && pct_start < 1.0,
            "OneCycleLr: pct_start must be in (0, 1), got {}",
            pct_start
        );
        debug_assert!(
            div_factor > 0.0 && final_div_factor > 0.0,
            "OneCycleLr: divisors must be positive"
        );

        let max_lr = sanitize_lr(max_lr);
        let total_steps = total_steps.max(1);
        let pct_start = if pct_start > 0.0 && pct_start < 1.0 {
            pct_start
        } else {
            0.3
        };
        let div_factor = if div_factor > 0.0 { div_factor } else { 25.0 };
        let final_div_factor = if final_div_factor > 0.0 {
            final_div_factor
        } else {
            1e4
        };

        let initial_lr = max_lr / div_factor;
        Self {
            max_lr,
            initial_lr,
            min_lr: initial_lr / final_div_factor,
            total_steps,
            warmup_end: pct_start * total_steps as f64 - 1.0,
        }
    }

    pub fn max_lr(&self) -> f64 {
        self.max_lr
    }

    pub fn initial_lr(&self) -> f64 {
        self.initial_lr
    }

    pub fn min_lr(&self) -> f64 {
        self.min_lr
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }
}

impl LrScheduler for OneCycleLr {
    fn get_lr(&self, step: usize) -> f64 {
        let last = (self.total_steps - 1) as f64;
        let step = (step as f64).min(last);

        if step <= self.warmup_end && self.warmup_end > 0.0 {
            return cosine_anneal(self.initial_lr, self.max_lr, step / self.warmup_end);
        }

        let warmup_end = self.warmup_end.max(0.0);
        let span = last - warmup_end;
        if span <= 0.0 {
            return self.min_lr;
        }
        cosine_anneal(self.max_lr, self.min_lr, (step - warmup_end) / span)
    }
}
