//! # vpg: Vanilla Policy Gradient
//!
//! Single-threaded on-policy trainer with a state-value baseline.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       BatchScheduler                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Environment ──step──▶ TrajectoryBuffer::add                 │
//! │                              │                               │
//! │                 episode end or buffer full                   │
//! │                              ▼                               │
//! │      AdvantageEstimator over the open span (plain or GAE)    │
//! │                              │                               │
//! │         write_episode_results + EpisodeStats::record         │
//! │                              │                               │
//! │                        buffer full                           │
//! │                              ▼                               │
//! │   extract_batch ──▶ ActorCritic::update ──▶ MetricsLogger    │
//! │                              │                               │
//! │                         reset_batch                          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The buffer holds exactly one batch. An episode may start in one batch and
//! end in the next; the part cut off by a full batch is bootstrapped from the
//! critic and only the part that reaches a real terminal state is counted in
//! the episode statistics.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use burn::backend::{Autodiff, NdArray};
//! use vpg::{ActorCriticConfig, AdamVpgLearner, BatchScheduler, ConstantLr, SchedulerConfig, TrainerConfig};
//!
//! type B = Autodiff<NdArray<f32>>;
//!
//! let config = TrainerConfig::from_json_file("settings/settings.json")?.build()?;
//! let env = vpg::make_env(&config.env_name, config.seed)?;
//! let net = ActorCriticConfig::new(env.obs_size(), env.n_actions(), config.hidden_dim);
//! let learner = AdamVpgLearner::<B>::with_adam(net, Box::new(ConstantLr::new(config.lr)), config.seed, Default::default());
//!
//! let mut scheduler = BatchScheduler::new(SchedulerConfig::from(&config), env, learner)?;
//! scheduler.run(|_| {})?;
//! ```

pub mod algorithms;
pub mod buffers;
pub mod config;
pub mod core;
pub mod environment;
pub mod error;
pub mod learner;
pub mod metrics;
pub mod runners;
pub mod scheduling;

pub use algorithms::{
    discounted_cumsum, normalize_advantages, rewards_to_go, AdvantageEstimator, EpisodeTargets,
};
pub use buffers::{BufferError, TrajectoryBatch, TrajectoryBuffer};
pub use config::{ConfigError, TrainerConfig, TruncationPolicy};
pub use crate::core::{AccumulatorError, EpisodeState, EpisodeStats, EpisodeSummary};
pub use environment::{make_env, CartPole, EnvError, EnvStep, Environment, StepInfo};
pub use error::TrainError;
pub use learner::{
    ActorCritic, ActorCriticConfig, AdamVpgLearner, LearnerError, UpdateStats, VpgLearner,
};
pub use metrics::{ConsoleLogger, CsvLogger, MetricsLogger, MultiLogger, TrainingSnapshot};
pub use runners::{
    BatchReport, BatchScheduler, EpisodeBoundaryReport, RunSummary, SchedulerConfig,
    SchedulerPhase, StepReport,
};
pub use scheduling::{ConstantLr, LrScheduler, OneCycleLr};
