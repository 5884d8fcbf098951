//! The circuit breaker / progress analyzer (spec §4.F): a pure function over
//! a rolling window of recent loop outcomes. No I/O, no async — the
//! dispatcher feeds it one [`LoopOutcome`] per agent loop and acts on the
//! returned [`Decision`].

use crate::config::BreakerConfig;
use crate::status_block::{LoopStatus, StatusBlock};

/// One agent loop's observable outcome, already reduced from the strategy's
/// raw output via [`crate::status_block::parse_status`] and
/// [`crate::error_signature::extract_error_signature`].
#[derive(Clone, Debug, Default)]
pub struct LoopOutcome {
    pub status: Option<StatusBlock>,
    pub files_modified: u32,
    pub pr_ready: bool,
    pub error_signature: Option<String>,
}

impl LoopOutcome {
    /// Zero progress: no files touched and the PR isn't ready (spec §4.F
    /// `closed -> half-open` / `half-open -> open` trigger condition).
    fn is_zero_progress(&self) -> bool {
        self.files_modified == 0 && !self.pr_ready
    }

    fn is_needs_clarification(&self) -> bool {
        matches!(
            self.status.as_ref().and_then(|s| s.status),
            Some(LoopStatus::NeedsClarification)
        ) || self.status.as_ref().is_some_and(|s| s.clarification_needed)
    }

    fn is_explicit_complete(&self) -> bool {
        self.pr_ready
            || matches!(
                self.status.as_ref().and_then(|s| s.status),
                Some(LoopStatus::Complete)
            )
    }
}

/// The three circuit states (spec §4.F).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    HalfOpen,
    Open,
}

/// The analyzer's decision for one loop (spec §4.F). `Continue` is not a
/// terminal loop outcome: the dispatcher keeps looping (or, for a
/// single-shot strategy, treats a final `Continue` as `Complete` once the
/// strategy itself has returned).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Continue,
    Clarify,
    Complete,
    Halt,
}

/// Rolling-window breaker state for one request's agent loop. Deterministic
/// given the sequence of `record` calls (spec §8 "The decision is
/// deterministic given the window").
#[derive(Clone, Debug)]
pub struct Breaker {
    config: BreakerConfig,
    state: CircuitState,
    zero_progress_streak: u32,
    identical_error_streak: u32,
    last_error_signature: Option<String>,
}

impl Breaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            state: CircuitState::Closed,
            zero_progress_streak: 0,
            identical_error_streak: 0,
            last_error_signature: None,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    /// Resets the breaker to `closed` with an empty window (spec §4.F
    /// "open: terminal until explicit reset on a new request or a `retry`
    /// user action").
    pub fn reset(&mut self) {
        *self = Self::new(self.config);
    }

    fn bump_error_streak(&mut self, outcome: &LoopOutcome) {
        match (&self.last_error_signature, &outcome.error_signature) {
            (Some(prev), Some(cur)) if prev == cur => self.identical_error_streak += 1,
            (_, Some(cur)) => {
                self.identical_error_streak = 1;
                self.last_error_signature = Some(cur.clone());
            }
            (_, None) => {
                self.identical_error_streak = 0;
                self.last_error_signature = None;
            }
        }
    }

    /// Feeds one loop's outcome into the breaker and returns the decision.
    pub fn record(&mut self, outcome: &LoopOutcome) -> Decision {
        if self.state == CircuitState::Open {
            return Decision::Halt;
        }

        self.bump_error_streak(outcome);
        if outcome.is_zero_progress() {
            self.zero_progress_streak += 1;
        } else {
            self.zero_progress_streak = 0;
        }

        match self.state {
            CircuitState::Closed => {
                if self.identical_error_streak >= self.config.identical_error_to_open {
                    self.state = CircuitState::Open;
                    return Decision::Halt;
                }
                if self.zero_progress_streak >= self.config.zero_progress_to_half_open {
                    self.state = CircuitState::HalfOpen;
                }
            }
            CircuitState::HalfOpen => {
                if !outcome.is_zero_progress() {
                    self.state = CircuitState::Closed;
                    self.zero_progress_streak = 0;
                } else if self.zero_progress_streak >= self.config.half_open_zero_progress_to_open
                {
                    self.state = CircuitState::Open;
                    return Decision::Halt;
                }
            }
            CircuitState::Open => unreachable!("handled above"),
        }

        if outcome.is_needs_clarification() {
            Decision::Clarify
        } else if outcome.is_explicit_complete() {
            Decision::Complete
        } else {
            Decision::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zero_progress() -> LoopOutcome {
        LoopOutcome {
            status: None,
            files_modified: 0,
            pr_ready: false,
            error_signature: None,
        }
    }

    fn progress() -> LoopOutcome {
        LoopOutcome {
            status: None,
            files_modified: 2,
            pr_ready: false,
            error_signature: None,
        }
    }

    /// **Scenario**: 2 consecutive zero-progress loops in `closed` trip to
    /// `half-open` (spec §8 boundary behavior).
    #[test]
    fn two_zero_progress_loops_trip_to_half_open() {
        let mut b = Breaker::new(BreakerConfig::default());
        assert_eq!(b.record(&zero_progress()), Decision::Continue);
        assert_eq!(b.state(), CircuitState::Closed);
        assert_eq!(b.record(&zero_progress()), Decision::Continue);
        assert_eq!(b.state(), CircuitState::HalfOpen);
    }

    /// **Scenario**: the 3rd zero-progress loop in `half-open` trips to `open`
    /// and halts (spec §8 boundary behavior).
    #[test]
    fn third_zero_progress_loop_in_half_open_trips_open() {
        let mut b = Breaker::new(BreakerConfig::default());
        b.record(&zero_progress());
        b.record(&zero_progress());
        assert_eq!(b.state(), CircuitState::HalfOpen);
        b.record(&zero_progress());
        assert_eq!(b.state(), CircuitState::HalfOpen);
        assert_eq!(b.record(&zero_progress()), Decision::Halt);
        assert_eq!(b.state(), CircuitState::Open);
    }

    /// **Scenario**: a progress loop at any time in `half-open` returns to
    /// `closed` (spec §8 boundary behavior).
    #[test]
    fn progress_in_half_open_returns_to_closed() {
        let mut b = Breaker::new(BreakerConfig::default());
        b.record(&zero_progress());
        b.record(&zero_progress());
        assert_eq!(b.state(), CircuitState::HalfOpen);
        b.record(&progress());
        assert_eq!(b.state(), CircuitState::Closed);
    }

    /// **Scenario**: 5 consecutive loops with an identical error signature
    /// trip `closed -> open` directly, without passing through `half-open`.
    #[test]
    fn five_identical_error_signatures_trip_open_from_closed() {
        let mut b = Breaker::new(BreakerConfig::default());
        let outcome = LoopOutcome {
            status: None,
            files_modified: 1,
            pr_ready: false,
            error_signature: Some("Error: ENOENT package.json".into()),
        };
        for _ in 0..4 {
            assert_eq!(b.record(&outcome.clone()), Decision::Continue);
            assert_eq!(b.state(), CircuitState::Closed);
        }
        assert_eq!(b.record(&outcome), Decision::Halt);
        assert_eq!(b.state(), CircuitState::Open);
    }

    /// **Scenario**: once `open`, the breaker halts every subsequent loop
    /// until an explicit reset (spec §4.F "terminal until explicit reset").
    #[test]
    fn open_is_terminal_until_reset() {
        let mut b = Breaker::new(BreakerConfig::default());
        for _ in 0..5 {
            b.record(&LoopOutcome {
                error_signature: Some("Fatal: x".into()),
                files_modified: 1,
                ..Default::default()
            });
        }
        assert_eq!(b.state(), CircuitState::Open);
        assert_eq!(b.record(&progress()), Decision::Halt);
        b.reset();
        assert_eq!(b.state(), CircuitState::Closed);
        assert_eq!(b.record(&progress()), Decision::Complete);
    }

    /// **Scenario**: a needs-clarification status yields `Decision::Clarify`
    /// even when progress was made this loop.
    #[test]
    fn clarification_status_yields_clarify() {
        let mut b = Breaker::new(BreakerConfig::default());
        let outcome = LoopOutcome {
            status: Some(StatusBlock {
                status: Some(LoopStatus::NeedsClarification),
                clarification_needed: true,
                ..Default::default()
            }),
            files_modified: 1,
            pr_ready: false,
            error_signature: None,
        };
        assert_eq!(b.record(&outcome), Decision::Clarify);
    }

    /// **Scenario**: `pr_ready` yields `Decision::Complete`.
    #[test]
    fn pr_ready_yields_complete() {
        let mut b = Breaker::new(BreakerConfig::default());
        let outcome = LoopOutcome {
            status: None,
            files_modified: 3,
            pr_ready: true,
            error_signature: None,
        };
        assert_eq!(b.record(&outcome), Decision::Complete);
    }
}
