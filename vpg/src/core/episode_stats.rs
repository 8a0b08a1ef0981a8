//! Per-batch episode statistics.
//!
//! Collects the return and length of every episode that terminated inside the
//! current batch. A batch can legitimately finish without any terminated
//! episode (one long episode spanning the whole batch), so [`EpisodeStats::summary`]
//! reports emptiness as an error instead of dividing by zero.

use thiserror::Error;

/// Error returned by [`EpisodeStats::summary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccumulatorError {
    /// No episode was recorded since the last clear.
    #[error("no completed episodes recorded since the last batch reset")]
    Empty,
}

/// Mean return and length over the recorded episodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeSummary {
    pub mean_return: f32,
    pub mean_length: f32,
    /// Number of episodes the means were taken over.
    pub episodes: usize,
}

/// Returns and lengths of completed episodes, in completion order.
#[derive(Debug, Clone, Default)]
pub struct EpisodeStats {
    returns: Vec<f32>,
    lengths: Vec<usize>,
}

impl EpisodeStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed episode.
    pub fn record(&mut self, total_return: f32, length: usize) {
        self.returns.push(total_return);
        self.lengths.push(length);
    }

    /// Mean return and mean length of the recorded episodes.
    pub fn summary(&self) -> Result<EpisodeSummary, AccumulatorError> {
        if self.returns.is_empty() {
            return Err(AccumulatorError::Empty);
        }

        let n = self.returns.len() as f32;
        let mean_return = self.returns.iter().sum::<f32>() / n;
        let mean_length = self.lengths.iter().sum::<usize>() as f32 / n;

        Ok(EpisodeSummary {
            mean_return,
            mean_length,
            episodes: self.returns.len(),
        })
    }

    /// Forget every recorded episode.
    pub fn clear(&mut self) {
        self.returns.clear();
        self.lengths.clear();
    }

    pub fn returns(&self) -> &[f32] {
        &self.returns
    }

    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    pub fn len(&self) -> usize {
        self.returns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }
}
