//! Experience storage for on-policy training.
//!
//! - `TrajectoryBuffer`: one batch of steps, sliced into episode spans,
//!   consumed and reset after each gradient update

pub mod trajectory_buffer;

pub use trajectory_buffer::{BufferError, TrajectoryBatch, TrajectoryBuffer};
