//! Core bookkeeping types shared by the buffer and the scheduler.

pub mod episode_state;
pub mod episode_stats;

pub use episode_state::EpisodeState;
pub use episode_stats::{AccumulatorError, EpisodeStats, EpisodeSummary};
