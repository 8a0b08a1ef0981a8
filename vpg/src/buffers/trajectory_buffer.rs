//! Fixed-capacity trajectory buffer for on-policy training.
//!
//! Key characteristics:
//! - Storage for exactly one batch is allocated at construction and never grows
//! - Two cursors slice it: `episode_start` marks where the in-progress episode
//!   begins, `batch_len` marks the next free slot
//! - The in-progress episode is always the suffix of the batch collected so far:
//!   `episode_start + episode_len == batch_len`
//! - Advantages and returns-to-go are written in place, one episode span at a time
//!
//! ```text
//!   0            episode_start        batch_len          capacity
//!   |  closed spans  |  open episode span  |    free slots    |
//! ```

use thiserror::Error;

use crate::core::EpisodeStats;

/// Buffer misuse. Every variant signals a scheduling defect, not a
/// recoverable runtime condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// `add` called on a full buffer that was not reset.
    #[error("buffer is full ({capacity} steps); the batch must be consumed and reset first")]
    Capacity { capacity: usize },
    /// Observation length does not match the buffer's observation size.
    #[error("observation has {got} values, buffer expects {expected}")]
    ObservationSize { expected: usize, got: usize },
    /// Estimator output length differs from the open episode span.
    #[error(
        "episode span has {expected} steps but got {advantages} advantages and {returns} returns"
    )]
    LengthMismatch {
        expected: usize,
        advantages: usize,
        returns: usize,
    },
    /// Episode span write would run past the end of the buffer.
    #[error("episode span [{start}, {start}+{len}) exceeds capacity {capacity}")]
    Overflow {
        start: usize,
        len: usize,
        capacity: usize,
    },
    /// `extract_batch` called before the buffer filled up.
    #[error("batch holds {len} of {capacity} steps")]
    BatchNotFull { len: usize, capacity: usize },
    /// `extract_batch` called while an episode span has no targets yet.
    #[error("episode span of {len} steps was not closed before extraction")]
    UnclosedEpisode { len: usize },
}

/// One full batch, ready for a gradient update.
///
/// All vectors are aligned by step index.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryBatch {
    /// Observations, row-major [len × obs_size].
    pub observations: Vec<f32>,
    /// Observation size per step.
    pub obs_size: usize,
    /// Discrete action indices [len].
    pub actions: Vec<u32>,
    /// Advantage estimates [len].
    pub advantages: Vec<f32>,
    /// Critic targets [len].
    pub returns_to_go: Vec<f32>,
}

impl TrajectoryBatch {
    /// Number of steps.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Observation of step `idx`.
    pub fn observation(&self, idx: usize) -> &[f32] {
        let start = idx * self.obs_size;
        &self.observations[start..start + self.obs_size]
    }
}

/// Arena of per-step records with episode and batch cursors.
#[derive(Debug, Clone)]
pub struct TrajectoryBuffer {
    capacity: usize,
    obs_size: usize,

    observations: Vec<f32>,
    actions: Vec<u32>,
    values: Vec<f32>,
    rewards: Vec<f32>,
    advantages: Vec<f32>,
    returns_to_go: Vec<f32>,

    episode_start: usize,
    episode_len: usize,
    batch_len: usize,

    stats: EpisodeStats,
}

impl TrajectoryBuffer {
    /// Create a buffer holding `capacity` steps of `obs_size`-dimensional observations.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` or `obs_size` is zero. Configuration validation
    /// rejects both before a buffer is built.
    pub fn new(capacity: usize, obs_size: usize) -> Self {
        assert!(capacity > 0, "TrajectoryBuffer: capacity must be > 0");
        assert!(obs_size > 0, "TrajectoryBuffer: obs_size must be > 0");

        Self {
            capacity,
            obs_size,
            observations: vec![0.0; capacity * obs_size],
            actions: vec![0; capacity],
            values: vec![0.0; capacity],
            rewards: vec![0.0; capacity],
            advantages: vec![0.0; capacity],
            returns_to_go: vec![0.0; capacity],
            episode_start: 0,
            episode_len: 0,
            batch_len: 0,
            stats: EpisodeStats::new(),
        }
    }

    /// Append one step at position `batch_len`.
    pub fn add(
        &mut self,
        observation: &[f32],
        action: u32,
        value: f32,
        reward: f32,
    ) -> Result<(), BufferError> {
        if self.is_full() {
            return Err(BufferError::Capacity {
                capacity: self.capacity,
            });
        }
        if observation.len() != self.obs_size {
            return Err(BufferError::ObservationSize {
                expected: self.obs_size,
                got: observation.len(),
            });
        }

        let idx = self.batch_len;
        let obs_start = idx * self.obs_size;
        self.observations[obs_start..obs_start + self.obs_size].copy_from_slice(observation);
        self.actions[idx] = action;
        self.values[idx] = value;
        self.rewards[idx] = reward;

        self.episode_len += 1;
        self.batch_len += 1;
        Ok(())
    }

    /// Values and rewards of the open episode span.
    pub fn episode_values_and_rewards(&self) -> (&[f32], &[f32]) {
        let span = self.episode_span();
        (&self.values[span.clone()], &self.rewards[span])
    }

    /// Write estimator output for the open episode span.
    ///
    /// Nothing is written unless both sequences match the span length.
    pub fn write_episode_results(
        &mut self,
        advantages: &[f32],
        returns_to_go: &[f32],
    ) -> Result<(), BufferError> {
        if advantages.len() != self.episode_len || returns_to_go.len() != self.episode_len {
            return Err(BufferError::LengthMismatch {
                expected: self.episode_len,
                advantages: advantages.len(),
                returns: returns_to_go.len(),
            });
        }
        if self.episode_start + self.episode_len > self.capacity {
            return Err(BufferError::Overflow {
                start: self.episode_start,
                len: self.episode_len,
                capacity: self.capacity,
            });
        }

        let span = self.episode_span();
        self.advantages[span.clone()].copy_from_slice(advantages);
        self.returns_to_go[span].copy_from_slice(returns_to_go);
        Ok(())
    }

    /// Close the open span: zero its values and rewards, move `episode_start`
    /// past it and start an empty span.
    pub fn close_episode(&mut self) {
        let span = self.episode_span();
        self.values[span.clone()].fill(0.0);
        self.rewards[span].fill(0.0);

        self.episode_start += self.episode_len;
        self.episode_len = 0;
    }

    /// Copy out the full batch.
    ///
    /// Call [`reset_batch`](Self::reset_batch) afterwards.
    pub fn extract_batch(&self) -> Result<TrajectoryBatch, BufferError> {
        if !self.is_full() {
            return Err(BufferError::BatchNotFull {
                len: self.batch_len,
                capacity: self.capacity,
            });
        }
        if self.episode_len != 0 {
            return Err(BufferError::UnclosedEpisode {
                len: self.episode_len,
            });
        }

        Ok(TrajectoryBatch {
            observations: self.observations.clone(),
            obs_size: self.obs_size,
            actions: self.actions.clone(),
            advantages: self.advantages.clone(),
            returns_to_go: self.returns_to_go.clone(),
        })
    }

    /// Rewind both cursors and clear the episode statistics.
    ///
    /// Advantage and return slots keep their old contents; every slot is
    /// rewritten before the next extraction.
    pub fn reset_batch(&mut self) {
        self.batch_len = 0;
        self.episode_start = 0;
        self.episode_len = 0;
        self.stats.clear();
    }

    /// Record a terminated episode in this batch's statistics.
    pub fn record_episode(&mut self, total_return: f32, length: usize) {
        self.stats.record(total_return, length);
    }

    pub fn stats(&self) -> &EpisodeStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut EpisodeStats {
        &mut self.stats
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn obs_size(&self) -> usize {
        self.obs_size
    }

    pub fn batch_len(&self) -> usize {
        self.batch_len
    }

    pub fn episode_start(&self) -> usize {
        self.episode_start
    }

    pub fn episode_len(&self) -> usize {
        self.episode_len
    }

    pub fn is_full(&self) -> bool {
        self.batch_len == self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.batch_len == 0
    }

    fn episode_span(&self) -> std::ops::Range<usize> {
        self.episode_start..self.episode_start + self.episode_len
    }
}
