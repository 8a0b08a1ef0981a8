//! Episode end classification.
//!
//! A batch can cut an episode short, so the end of a data span is not always
//! the end of the episode. The two cases bootstrap differently:
//!
//! - **Terminal**: the environment reached a true terminal state.
//!   - Bootstrap value: exactly 0.0 (no future rewards possible)
//!   - Episode statistics: recorded
//!   - Environment: reset
//!
//! - **Truncated**: the batch filled up before the episode ended.
//!   - Bootstrap value: V(s') of the observation after the last stored step
//!   - Episode statistics: not recorded (the episode is still running)
//!   - Environment: kept, the episode continues in the next batch

/// How the current episode span ended, if it ended at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EpisodeState {
    /// Episode is ongoing, no boundary.
    #[default]
    Running,
    /// Environment signalled termination. Bootstrap with 0.
    Terminal,
    /// Batch capacity reached mid-episode. Bootstrap with V(s').
    Truncated,
}

impl EpisodeState {
    /// Classify from the environment `done` flag and the buffer-full flag.
    ///
    /// If both are set, Terminal takes precedence: the episode really ended
    /// and there is nothing left to bootstrap.
    #[inline]
    pub fn from_flags(terminal: bool, truncated: bool) -> Self {
        if terminal {
            Self::Terminal
        } else if truncated {
            Self::Truncated
        } else {
            Self::Running
        }
    }

    /// Whether the estimator needs a bootstrap value for this span.
    #[inline]
    pub fn needs_bootstrap(&self) -> bool {
        matches!(self, Self::Truncated)
    }

    /// Value appended past the end of the span.
    ///
    /// `bootstrap` is only evaluated for truncated spans, so callers can pass
    /// a closure that runs the critic.
    pub fn last_value<E>(&self, bootstrap: impl FnOnce() -> Result<f32, E>) -> Result<f32, E> {
        if self.needs_bootstrap() {
            bootstrap()
        } else {
            Ok(0.0)
        }
    }

    /// Whether the span's return/length go into the episode statistics.
    #[inline]
    pub fn should_record(&self) -> bool {
        matches!(self, Self::Terminal)
    }

    /// Whether the span ended (terminal or truncated).
    #[inline]
    pub fn is_done(&self) -> bool {
        !matches!(self, Self::Running)
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal)
    }

    #[inline]
    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::Truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flags_terminal() {
        let state = EpisodeState::from_flags(true, false);
        assert_eq!(state, EpisodeState::Terminal);
        assert!(!state.needs_bootstrap());
        assert!(state.should_record());
        assert!(state.is_done());
    }

    #[test]
    fn test_from_flags_truncated() {
        let state = EpisodeState::from_flags(false, true);
        assert_eq!(state, EpisodeState::Truncated);
        assert!(state.needs_bootstrap());
        assert!(!state.should_record());
        assert!(state.is_done());
    }

    #[test]
    fn test_from_flags_running() {
        let state = EpisodeState::from_flags(false, false);
        assert_eq!(state, EpisodeState::Running);
        assert!(!state.is_done());
        assert_eq!(EpisodeState::default(), EpisodeState::Running);
    }

    #[test]
    fn test_terminal_wins_when_batch_also_full() {
        let state = EpisodeState::from_flags(true, true);
        assert_eq!(state, EpisodeState::Terminal);
    }

    #[test]
    fn test_last_value_is_zero_on_terminal() {
        let state = EpisodeState::Terminal;
        let mut called = false;
        let value: Result<f32, ()> = state.last_value(|| {
            called = true;
            Ok(42.0)
        });
        assert_eq!(value, Ok(0.0));
        assert!(!called, "critic must not be queried for terminal spans");
    }

    #[test]
    fn test_last_value_bootstraps_on_truncation() {
        let value: Result<f32, ()> = EpisodeState::Truncated.last_value(|| Ok(3.5));
        assert_eq!(value, Ok(3.5));
    }

    #[test]
    fn test_last_value_propagates_bootstrap_error() {
        let value: Result<f32, &str> = EpisodeState::Truncated.last_value(|| Err("critic failed"));
        assert_eq!(value, Err("critic failed"));
    }
}
