//! Batch scheduler tests.
//!
//! Test categories:
//! 1. Cursor invariant under mixed boundaries
//! 2. Bootstrap values at terminal and truncated boundaries
//! 3. Episodes spanning batch boundaries
//! 4. Empty-batch reporting
//! 5. run() and failure handling

use super::mocks::{MockAgent, RecordingLogger, ScriptedEnv};
use crate::algorithms::AdvantageEstimator;
use crate::config::{ConfigError, TruncationPolicy};
use crate::core::{EpisodeState, EpisodeSummary};
use crate::environment::EnvError;
use crate::error::TrainError;
use crate::learner::LearnerError;
use crate::runners::{BatchScheduler, SchedulerConfig, SchedulerPhase};

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Bootstrap estimate the mock critic reports.
const V: f32 = 5.0;

fn scheduler_with(
    config: SchedulerConfig,
    episode_len: usize,
) -> BatchScheduler<ScriptedEnv, MockAgent> {
    BatchScheduler::new(config, ScriptedEnv::new(episode_len), MockAgent::new(0.0, V))
        .expect("scheduler")
}

/// γ = 1, plain returns, critic always predicts 0 while acting.
fn scheduler(batch_size: usize, episode_len: usize) -> BatchScheduler<ScriptedEnv, MockAgent> {
    scheduler_with(SchedulerConfig::new(batch_size, 1_000, 1.0), episode_len)
}

fn assert_close(actual: &[f32], expected: &[f32]) {
    assert_eq!(actual.len(), expected.len());
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!((a - e).abs() < 1e-5, "index {}: {} != {}", i, a, e);
    }
}

fn assert_cursor_invariant(scheduler: &BatchScheduler<ScriptedEnv, MockAgent>) {
    let buffer = scheduler.buffer();
    assert_eq!(buffer.episode_start() + buffer.episode_len(), buffer.batch_len());
    assert!(buffer.batch_len() <= buffer.capacity());
}

// =============================================================================
// 1. CURSOR INVARIANT
// =============================================================================

#[test]
fn test_invariant_holds_for_every_step() {
    for &(batch_size, episode_len) in &[(3, 2), (3, 5), (4, 4), (5, 1), (2, 7)] {
        let mut scheduler = scheduler(batch_size, episode_len);
        assert_cursor_invariant(&scheduler);

        for _ in 0..30 {
            scheduler.step().unwrap();
            assert_cursor_invariant(&scheduler);
            assert_eq!(scheduler.phase(), SchedulerPhase::Collecting);
            assert_eq!(
                scheduler.buffer().batch_len(),
                scheduler.iteration() % batch_size,
                "batch {} episode {}",
                batch_size,
                episode_len
            );
        }
    }
}

#[test]
fn test_every_batch_has_every_slot_written() {
    let mut scheduler = scheduler(4, 3);
    for _ in 0..12 {
        scheduler.step().unwrap();
    }

    let batches = &scheduler.agent().batches;
    assert_eq!(batches.len(), 3);
    for batch in batches {
        assert_eq!(batch.len(), 4);
        assert!(batch.returns_to_go.iter().all(|&r| r >= 1.0));
    }
}

// =============================================================================
// 2. BOOTSTRAP VALUES
// =============================================================================

#[test]
fn test_terminal_bootstraps_from_zero() {
    let mut scheduler = scheduler(10, 2);

    assert!(scheduler.step().unwrap().episode.is_none());
    let report = scheduler.step().unwrap().episode.expect("episode boundary");

    assert_eq!(report.state, EpisodeState::Terminal);
    assert_eq!(report.last_value, 0.0);
    assert_eq!(report.len, 2);
    // The critic is never consulted for a terminal span.
    assert_eq!(scheduler.agent().value_calls.get(), 0);
    assert_eq!(scheduler.env().resets, 2);
}

#[test]
fn test_truncated_bootstraps_from_value_estimate() {
    let mut scheduler = scheduler(3, 10);

    scheduler.step().unwrap();
    scheduler.step().unwrap();
    let report = scheduler.step().unwrap();
    let episode = report.episode.expect("episode boundary");

    assert_eq!(episode.state, EpisodeState::Truncated);
    assert_eq!(episode.last_value, V);
    assert_eq!(scheduler.agent().value_calls.get(), 1);

    // Advantages carry the bootstrap; critic targets do not.
    let batch = &scheduler.agent().batches[0];
    assert_close(&batch.advantages, &[V + 3.0, V + 2.0, V + 1.0]);
    assert_close(&batch.returns_to_go, &[3.0, 2.0, 1.0]);
}

#[test]
fn test_terminal_wins_when_episode_and_batch_end_together() {
    let config = SchedulerConfig::new(3, 1_000, 0.5)
        .with_estimator(AdvantageEstimator::Gae { lambda: 1.0 });
    let mut scheduler = scheduler_with(config, 3);

    scheduler.step().unwrap();
    scheduler.step().unwrap();
    let report = scheduler.step().unwrap();

    let episode = report.episode.expect("episode boundary");
    assert_eq!(episode.state, EpisodeState::Terminal);
    assert_eq!(episode.last_value, 0.0);

    let batch = report.batch.expect("batch boundary");
    assert_eq!(
        batch.summary,
        Some(EpisodeSummary {
            mean_return: 3.0,
            mean_length: 3.0,
            episodes: 1,
        })
    );

    let data = &scheduler.agent().batches[0];
    assert_close(&data.advantages, &[1.75, 1.5, 1.0]);
    assert_close(&data.returns_to_go, &[1.75, 1.5, 1.0]);
    assert_eq!(scheduler.agent().value_calls.get(), 0);
}

// =============================================================================
// 3. EPISODES SPANNING BATCH BOUNDARIES
// =============================================================================

#[test]
fn test_episode_spanning_batch_boundary() {
    let logger = RecordingLogger::default();
    let mut scheduler = scheduler(3, 5).with_logger(Box::new(logger.clone()));

    // Steps 1-2: collecting only.
    for _ in 0..2 {
        let report = scheduler.step().unwrap();
        assert!(report.episode.is_none());
        assert!(report.batch.is_none());
    }

    // Step 3: the batch cuts the episode.
    let report = scheduler.step().unwrap();
    assert_eq!(report.iteration, 3);
    let episode = report.episode.expect("truncation");
    assert_eq!(episode.state, EpisodeState::Truncated);
    assert_eq!((episode.start, episode.len), (0, 3));
    assert_eq!(episode.last_value, V);
    let batch = report.batch.expect("batch boundary");
    assert_eq!(batch.batch, 1);
    assert_eq!(batch.summary, None);

    assert!(scheduler.buffer().is_empty());
    assert!(scheduler.buffer().stats().is_empty());
    // The environment keeps running.
    assert_eq!(scheduler.env().resets, 1);

    // Step 4: the same episode continues from the start of the new batch.
    let report = scheduler.step().unwrap();
    assert!(report.episode.is_none());
    assert_eq!(scheduler.buffer().episode_start(), 0);
    assert_eq!(scheduler.buffer().episode_len(), 1);

    // Step 5: natural termination records only the post-boundary slice.
    let report = scheduler.step().unwrap();
    let episode = report.episode.expect("termination");
    assert_eq!(episode.state, EpisodeState::Terminal);
    assert_eq!((episode.start, episode.len), (0, 2));
    assert_eq!(episode.total_return, 2.0);
    assert_eq!(scheduler.buffer().stats().lengths(), &[2]);
    assert_eq!(scheduler.env().resets, 2);

    // Step 6: batch 2 closes with one finished episode.
    let report = scheduler.step().unwrap();
    let episode = report.episode.expect("truncation");
    assert_eq!(episode.state, EpisodeState::Truncated);
    assert_eq!((episode.start, episode.len), (2, 1));
    let batch = report.batch.expect("batch boundary");
    assert_eq!(
        batch.summary,
        Some(EpisodeSummary {
            mean_return: 2.0,
            mean_length: 2.0,
            episodes: 1,
        })
    );

    let batches = &scheduler.agent().batches;
    assert_eq!(batches[0].observation(0), &[0.0, 0.0]);
    assert_eq!(batches[0].observation(2), &[0.0, 2.0]);
    assert_close(&batches[0].advantages, &[V + 3.0, V + 2.0, V + 1.0]);

    assert_eq!(batches[1].observation(0), &[0.0, 3.0]);
    assert_eq!(batches[1].observation(1), &[0.0, 4.0]);
    assert_eq!(batches[1].observation(2), &[1.0, 0.0]);
    assert_close(&batches[1].advantages, &[2.0, 1.0, V + 1.0]);
    assert_close(&batches[1].returns_to_go, &[2.0, 1.0, 1.0]);

    // Only the batch with a finished episode was reported.
    let snapshots = logger.snapshots.borrow();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].iteration, 6);
    assert_eq!(snapshots[0].batches, 2);
    assert_eq!(snapshots[0].episodes, 1);
    assert_eq!(snapshots[0].mean_return, 2.0);
    assert_eq!(snapshots[0].policy_loss, 0.25);
}

#[test]
fn test_reset_truncation_policy_restarts_the_episode() {
    let config = SchedulerConfig::new(3, 1_000, 1.0).with_truncation(TruncationPolicy::Reset);
    let mut scheduler = scheduler_with(config, 5);

    for _ in 0..3 {
        scheduler.step().unwrap();
    }
    assert_eq!(scheduler.env().resets, 2);

    for _ in 0..3 {
        scheduler.step().unwrap();
    }
    let batch = &scheduler.agent().batches[1];
    assert_eq!(batch.observation(0), &[1.0, 0.0]);
    assert_eq!(batch.observation(2), &[1.0, 2.0]);
    // No episode reached its end.
    assert_eq!(scheduler.summary().episodes, 0);
}

// =============================================================================
// 4. EMPTY-BATCH REPORTING
// =============================================================================

#[test]
fn test_batch_without_finished_episode_skips_report() {
    let logger = RecordingLogger::default();
    let mut scheduler = scheduler(4, 100).with_logger(Box::new(logger.clone()));

    let mut last = None;
    for _ in 0..4 {
        last = Some(scheduler.step().unwrap());
    }

    let batch = last.and_then(|r| r.batch).expect("batch boundary");
    assert_eq!(batch.summary, None);
    assert_eq!(scheduler.agent().batches.len(), 1);
    assert!(logger.snapshots.borrow().is_empty());
    assert_eq!(scheduler.summary().last_summary, None);
}

// =============================================================================
// 5. RUN AND FAILURES
// =============================================================================

#[test]
fn test_run_spends_iteration_budget() {
    let mut scheduler = scheduler_with(SchedulerConfig::new(3, 10, 1.0), 4);

    let mut reports = 0;
    let summary = scheduler.run(|_| reports += 1).unwrap();

    assert_eq!(reports, 10);
    assert_eq!(summary.iterations, 10);
    assert_eq!(summary.batches, 3);
    // Episodes end at steps 4 and 8.
    assert_eq!(summary.episodes, 2);
    assert_eq!(
        summary.last_summary,
        Some(EpisodeSummary {
            mean_return: 2.0,
            mean_length: 2.0,
            episodes: 1,
        })
    );
    assert_eq!(scheduler.buffer().batch_len(), 1);
}

#[test]
fn test_failed_update_is_retried_on_next_step() {
    let mut reference = scheduler(2, 10);
    let mut agent = MockAgent::new(0.0, V);
    agent.failing_updates = 1;
    let mut scheduler_failing =
        BatchScheduler::new(SchedulerConfig::new(2, 100, 1.0), ScriptedEnv::new(10), agent)
            .expect("scheduler");

    scheduler_failing.step().unwrap();
    let err = scheduler_failing.step().unwrap_err();
    assert!(matches!(err, TrainError::Learner(LearnerError::NonFinite { .. })));
    assert_eq!(scheduler_failing.phase(), SchedulerPhase::BatchBoundary);
    assert!(scheduler_failing.buffer().is_full());

    let report = scheduler_failing.step().unwrap();
    assert!(report.episode.is_none());
    assert_eq!(report.batch.map(|b| b.batch), Some(1));
    assert_eq!(report.iteration, 3);
    assert_eq!(scheduler_failing.buffer().batch_len(), 1);

    // Same data as an unfailing run.
    reference.step().unwrap();
    reference.step().unwrap();
    assert_eq!(reference.agent().batches, scheduler_failing.agent().batches);
}

#[test]
fn test_failed_reset_retries_episode_boundary_once() {
    let mut env = ScriptedEnv::new(2);
    // First reset happens in `new`; the one after the first episode fails.
    env.fail_reset_at = Some(2);
    let mut scheduler =
        BatchScheduler::new(SchedulerConfig::new(10, 100, 1.0), env, MockAgent::new(0.0, V))
            .expect("scheduler");

    scheduler.step().unwrap();
    let err = scheduler.step().unwrap_err();
    assert!(matches!(err, TrainError::Env(EnvError::NeedsReset)));
    assert_eq!(
        scheduler.phase(),
        SchedulerPhase::EpisodeBoundary(EpisodeState::Terminal)
    );
    assert_eq!(scheduler.buffer().episode_start(), 0);
    assert_eq!(scheduler.buffer().episode_len(), 2);
    assert!(scheduler.buffer().stats().is_empty());

    let report = scheduler.step().unwrap();
    let episode = report.episode.expect("episode boundary");
    assert_eq!(episode.state, EpisodeState::Terminal);
    assert_eq!(episode.start, 0);
    assert_eq!(episode.len, 2);
    assert_eq!(episode.total_return, 2.0);
    assert_eq!(report.iteration, 3);

    let stats = scheduler.buffer().stats();
    assert_eq!(stats.len(), 1);
    assert_eq!(
        stats.summary().unwrap(),
        EpisodeSummary {
            mean_return: 2.0,
            mean_length: 2.0,
            episodes: 1,
        }
    );
    assert_eq!(scheduler.buffer().episode_start(), 2);
    assert_eq!(scheduler.buffer().episode_len(), 1);
    assert_eq!(scheduler.env().episode, 1);
    assert_cursor_invariant(&scheduler);
}

#[test]
fn test_environment_error_propagates() {
    let mut env = ScriptedEnv::new(10);
    env.fail_at = Some(2);
    let mut scheduler =
        BatchScheduler::new(SchedulerConfig::new(4, 100, 1.0), env, MockAgent::new(0.0, V))
            .expect("scheduler");

    scheduler.step().unwrap();
    let err = scheduler.step().unwrap_err();
    assert!(matches!(err, TrainError::Env(EnvError::NeedsReset)));
    assert_eq!(scheduler.iteration(), 1);
    assert_eq!(scheduler.buffer().batch_len(), 1);
}

#[test]
fn test_zero_batch_size_is_rejected() {
    let err = BatchScheduler::new(
        SchedulerConfig::new(0, 10, 1.0),
        ScriptedEnv::new(3),
        MockAgent::new(0.0, V),
    )
    .err()
    .expect("zero batch size must fail");

    assert!(matches!(
        err,
        TrainError::Config(ConfigError::InvalidCount {
            field: "batch_size",
            ..
        })
    ));
}
