//! Training loop.
//!
//! - [`BatchScheduler`]: collects fixed-size batches from one environment,
//!   closes episode spans and hands full batches to the learner

pub mod batch_scheduler;

#[cfg(test)]
mod tests;

pub use batch_scheduler::{
    BatchReport, BatchScheduler, EpisodeBoundaryReport, RunSummary, SchedulerConfig,
    SchedulerPhase, StepReport,
};
