//! Batch scheduler: the single-threaded training loop.
//!
//! Slices a continuous stream of environment steps into episodes and
//! fixed-size batches:
//!
//! ```text
//!   Collecting ──done or buffer full──▶ EpisodeBoundary(state)
//!       ▲                                   │
//!       │◀────────── not full ──────────────┤
//!       │                                   ▼ full
//!       └────────────────────────────── BatchBoundary
//! ```
//!
//! At an episode boundary the open span gets its advantages and
//! returns-to-go. A `Terminal` span bootstraps from 0.0, is recorded in the
//! batch statistics and resets the environment. A `Truncated` span (the
//! batch filled up mid-episode) bootstraps from V(next observation), is not
//! recorded, and by default keeps the environment running so the episode
//! continues into the next batch.
//!
//! At a batch boundary the full batch goes to the learner, statistics are
//! reported (skipped when no episode terminated) and the buffer is reset.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::algorithms::AdvantageEstimator;
use crate::buffers::TrajectoryBuffer;
use crate::config::{ConfigError, TrainerConfig, TruncationPolicy};
use crate::core::{EpisodeState, EpisodeSummary};
use crate::environment::Environment;
use crate::error::TrainError;
use crate::learner::{ActorCritic, UpdateStats};
use crate::metrics::{MetricsLogger, MultiLogger, TrainingSnapshot};

/// Settings the scheduler needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerConfig {
    /// Steps per batch; the buffer capacity.
    pub batch_size: usize,
    /// Environment steps to run.
    pub iterations: usize,
    pub gamma: f32,
    pub estimator: AdvantageEstimator,
    pub truncation: TruncationPolicy,
}

impl SchedulerConfig {
    pub fn new(batch_size: usize, iterations: usize, gamma: f32) -> Self {
        Self {
            batch_size,
            iterations,
            gamma,
            estimator: AdvantageEstimator::PlainReturns,
            truncation: TruncationPolicy::Continue,
        }
    }

    pub fn with_estimator(mut self, estimator: AdvantageEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn with_truncation(mut self, truncation: TruncationPolicy) -> Self {
        self.truncation = truncation;
        self
    }
}

impl From<&TrainerConfig> for SchedulerConfig {
    fn from(config: &TrainerConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            iterations: config.iterations,
            gamma: config.gamma,
            estimator: config.estimator(),
            truncation: config.truncation,
        }
    }
}

/// Where the scheduler is in its cycle.
///
/// Between calls to [`BatchScheduler::step`] the phase is `Collecting`
/// unless a boundary failed; the next `step` resumes that boundary first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    Collecting,
    EpisodeBoundary(EpisodeState),
    BatchBoundary,
}

/// An episode span that was closed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeBoundaryReport {
    pub state: EpisodeState,
    /// Bootstrap value used past the end of the span.
    pub last_value: f32,
    /// Offset of the span within the batch.
    pub start: usize,
    pub len: usize,
    /// Sum of the span's rewards.
    pub total_return: f32,
}

/// A batch that was consumed by the learner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchReport {
    /// 1-based batch index.
    pub batch: usize,
    pub update: UpdateStats,
    /// `None` when no episode terminated inside the batch.
    pub summary: Option<EpisodeSummary>,
}

/// What happened during one [`BatchScheduler::step`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepReport {
    /// Environment steps taken so far.
    pub iteration: usize,
    pub episode: Option<EpisodeBoundaryReport>,
    pub batch: Option<BatchReport>,
}

/// Totals for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunSummary {
    pub iterations: usize,
    pub batches: usize,
    /// Terminated episodes across all batches.
    pub episodes: usize,
    pub last_summary: Option<EpisodeSummary>,
}

/// Drives an environment and an actor-critic through fixed-size batches.
pub struct BatchScheduler<E: Environment, A: ActorCritic> {
    config: SchedulerConfig,
    env: E,
    agent: A,
    buffer: TrajectoryBuffer,
    observation: Vec<f32>,
    phase: SchedulerPhase,
    iteration: usize,
    batches: usize,
    episodes: usize,
    last_summary: Option<EpisodeSummary>,
    logger: Box<dyn MetricsLogger>,
    start_time: Instant,
}

impl<E: Environment, A: ActorCritic> BatchScheduler<E, A> {
    /// Reset the environment and allocate a buffer sized from it.
    pub fn new(config: SchedulerConfig, mut env: E, agent: A) -> Result<Self, TrainError> {
        if config.batch_size == 0 {
            return Err(ConfigError::InvalidCount {
                field: "batch_size",
                value: 0,
            }
            .into());
        }

        let obs_size = env.obs_size();
        let observation = env.reset()?;
        if observation.len() != obs_size {
            return Err(TrainError::ObservationSize {
                env: observation.len(),
                buffer: obs_size,
            });
        }

        Ok(Self {
            config,
            env,
            agent,
            buffer: TrajectoryBuffer::new(config.batch_size, obs_size),
            observation,
            phase: SchedulerPhase::Collecting,
            iteration: 0,
            batches: 0,
            episodes: 0,
            last_summary: None,
            logger: Box::new(MultiLogger::new()),
            start_time: Instant::now(),
        })
    }

    /// Report per-batch metrics to `logger`.
    pub fn with_logger(mut self, logger: Box<dyn MetricsLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// One environment interaction plus any boundary handling it triggers.
    pub fn step(&mut self) -> Result<StepReport, TrainError> {
        let mut report = StepReport::default();
        let mut collected = false;

        loop {
            match self.phase {
                SchedulerPhase::Collecting if collected => break,
                SchedulerPhase::Collecting => {
                    self.phase = self.collect()?;
                    collected = true;
                }
                SchedulerPhase::EpisodeBoundary(state) => {
                    report.episode = Some(self.close_episode(state)?);
                    self.phase = if self.buffer.is_full() {
                        SchedulerPhase::BatchBoundary
                    } else {
                        SchedulerPhase::Collecting
                    };
                }
                SchedulerPhase::BatchBoundary => {
                    report.batch = Some(self.close_batch()?);
                    self.phase = SchedulerPhase::Collecting;
                }
            }
        }

        report.iteration = self.iteration;
        Ok(report)
    }

    /// Step until the iteration budget is spent, passing every report to
    /// `callback`.
    pub fn run<F: FnMut(&StepReport)>(&mut self, mut callback: F) -> Result<RunSummary, TrainError> {
        info!(
            iterations = self.config.iterations,
            batch_size = self.config.batch_size,
            gamma = self.config.gamma,
            estimator = ?self.config.estimator,
            "starting training"
        );
        self.start_time = Instant::now();

        while self.iteration < self.config.iterations {
            let report = self.step()?;
            callback(&report);
        }
        self.logger.flush();

        let summary = self.summary();
        info!(
            iterations = summary.iterations,
            batches = summary.batches,
            episodes = summary.episodes,
            elapsed_secs = self.start_time.elapsed().as_secs_f32(),
            "training finished"
        );
        Ok(summary)
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            iterations: self.iteration,
            batches: self.batches,
            episodes: self.episodes,
            last_summary: self.last_summary,
        }
    }

    pub fn phase(&self) -> SchedulerPhase {
        self.phase
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn batches(&self) -> usize {
        self.batches
    }

    pub fn buffer(&self) -> &TrajectoryBuffer {
        &self.buffer
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn agent(&self) -> &A {
        &self.agent
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Act, step the environment and store the step.
    fn collect(&mut self) -> Result<SchedulerPhase, TrainError> {
        let (action, value) = self.agent.act(&self.observation)?;
        let step = self.env.step(action)?;

        self.buffer.add(&self.observation, action, value, step.reward)?;
        self.observation = step.observation;
        self.iteration += 1;

        let state = EpisodeState::from_flags(step.done, self.buffer.is_full());
        Ok(if state.is_done() {
            SchedulerPhase::EpisodeBoundary(state)
        } else {
            SchedulerPhase::Collecting
        })
    }

    fn close_episode(&mut self, state: EpisodeState) -> Result<EpisodeBoundaryReport, TrainError> {
        let last_value = state.last_value(|| self.agent.value(&self.observation))?;

        let (values, rewards) = self.buffer.episode_values_and_rewards();
        let targets = self
            .config
            .estimator
            .estimate(rewards, values, last_value, self.config.gamma);
        let total_return: f32 = rewards.iter().sum();
        let start = self.buffer.episode_start();
        let len = rewards.len();

        // Reset before touching the buffer so a failed reset leaves the span
        // open for the retry.
        let next_observation =
            if state.is_terminal() || self.config.truncation == TruncationPolicy::Reset {
                Some(self.env.reset()?)
            } else {
                None
            };

        self.buffer
            .write_episode_results(&targets.advantages, &targets.returns_to_go)?;
        if state.should_record() {
            self.buffer.record_episode(total_return, len);
            self.episodes += 1;
        }
        self.buffer.close_episode();

        if let Some(observation) = next_observation {
            self.observation = observation;
        }

        debug!(?state, start, len, total_return, last_value, "episode boundary");

        Ok(EpisodeBoundaryReport {
            state,
            last_value,
            start,
            len,
            total_return,
        })
    }

    fn close_batch(&mut self) -> Result<BatchReport, TrainError> {
        let batch = self.buffer.extract_batch()?;
        let update = self.agent.update(&batch)?;
        self.batches += 1;

        let summary = match self.buffer.stats().summary() {
            Ok(summary) => Some(summary),
            Err(err) => {
                warn!(batch = self.batches, %err, "no episode finished in this batch; skipping report");
                None
            }
        };

        if let Some(summary) = summary {
            let snapshot = TrainingSnapshot::new(
                self.iteration,
                self.batches,
                summary.episodes,
                summary.mean_return,
            )
            .with_mean_length(summary.mean_length)
            .with_losses(update.policy_loss, update.value_loss)
            .with_learning_rate(update.learning_rate)
            .with_elapsed(self.start_time.elapsed().as_secs_f32());
            self.logger.log(&snapshot);
            self.last_summary = Some(summary);
        }

        self.buffer.reset_batch();
        debug!(
            batch = self.batches,
            iteration = self.iteration,
            policy_loss = update.policy_loss,
            value_loss = update.value_loss,
            "batch boundary"
        );

        Ok(BatchReport {
            batch: self.batches,
            update,
            summary,
        })
    }
}
