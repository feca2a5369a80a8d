//! Bounded retry state machine for a single job.
//!
//! Every job walks through
//!
//! ```text
//! Pending ──▶ Attempting ──▶ Succeeded
//!                │  ▲
//!                ▼  │
//!             Retrying
//!                │
//!                ▼
//!              Failed
//! ```
//!
//! Any failed attempt is retried until `max_attempts` fetches have been made;
//! there is no delay between attempts. The machine holds no I/O so it can be
//! driven directly in tests.
//!
//! # Example
//!
//! ```
//! use bulk_dl_core::download::{AttemptResult, JobState, RetryPolicy, RetryStateMachine};
//!
//! let mut machine = RetryStateMachine::new(RetryPolicy::with_max_attempts(2));
//! assert_eq!(machine.begin_attempt(), Some(1));
//! machine.record(AttemptResult::failure("connection reset"));
//! assert_eq!(machine.begin_attempt(), Some(2));
//! assert_eq!(machine.record(AttemptResult::Success), JobState::Succeeded { attempts: 2 });
//! assert_eq!(machine.begin_attempt(), None);
//! ```

use tracing::{debug, trace};

use super::constants::DEFAULT_MAX_ATTEMPTS;

/// How many times a job may be fetched in total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy allowing `max_attempts` fetches; zero is raised to one.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Returns the maximum number of attempts configured.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

/// Outcome of one attempt, consumed by the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptResult {
    /// The fetch completed.
    Success,
    /// The fetch failed; `reason` is the rendered error.
    TransientFailure(String),
}

impl AttemptResult {
    /// Creates a failure result from anything displayable.
    pub fn failure(reason: impl ToString) -> Self {
        Self::TransientFailure(reason.to_string())
    }
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Not yet attempted.
    Pending,
    /// Attempt number `attempt` (1-based) is in flight.
    Attempting {
        /// Current attempt number.
        attempt: u32,
    },
    /// The last attempt failed and another one is allowed.
    Retrying {
        /// Attempts made so far.
        attempts: u32,
    },
    /// Terminal: an attempt succeeded.
    Succeeded {
        /// Attempts made, including the successful one.
        attempts: u32,
    },
    /// Terminal: every allowed attempt failed, or the job was aborted.
    Failed {
        /// Attempts made.
        attempts: u32,
    },
}

impl JobState {
    /// Returns true for `Succeeded` and `Failed`.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Failed { .. })
    }
}

/// Drives one job from `Pending` to a terminal state.
#[derive(Debug, Clone)]
pub struct RetryStateMachine {
    policy: RetryPolicy,
    state: JobState,
}

impl RetryStateMachine {
    /// Creates a machine in the `Pending` state.
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            state: JobState::Pending,
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> JobState {
        self.state
    }

    /// Returns the number of attempts started so far.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self.state {
            JobState::Pending => 0,
            JobState::Attempting { attempt } => attempt,
            JobState::Retrying { attempts }
            | JobState::Succeeded { attempts }
            | JobState::Failed { attempts } => attempts,
        }
    }

    /// Moves `Pending`/`Retrying` to `Attempting` and returns the new attempt number.
    ///
    /// Returns `None` when no attempt may start: the job is terminal or an
    /// attempt is already in flight.
    pub fn begin_attempt(&mut self) -> Option<u32> {
        let attempt = match self.state {
            JobState::Pending => 1,
            JobState::Retrying { attempts } => attempts + 1,
            JobState::Attempting { .. } | JobState::Succeeded { .. } | JobState::Failed { .. } => {
                return None;
            }
        };
        trace!(attempt, max_attempts = self.policy.max_attempts, "attempt starting");
        self.state = JobState::Attempting { attempt };
        Some(attempt)
    }

    /// Applies the result of the in-flight attempt and returns the new state.
    ///
    /// Outside `Attempting` this is a no-op returning the current state.
    pub fn record(&mut self, result: AttemptResult) -> JobState {
        let JobState::Attempting { attempt } = self.state else {
            debug!(state = ?self.state, "ignoring attempt result outside Attempting");
            return self.state;
        };

        self.state = match result {
            AttemptResult::Success => JobState::Succeeded { attempts: attempt },
            AttemptResult::TransientFailure(reason) if attempt < self.policy.max_attempts => {
                debug!(attempt, %reason, "attempt failed, will retry");
                JobState::Retrying { attempts: attempt }
            }
            AttemptResult::TransientFailure(reason) => {
                debug!(attempt, %reason, "attempt failed, no attempts left");
                JobState::Failed { attempts: attempt }
            }
        };
        self.state
    }

    /// Forces a non-terminal job into `Failed` without counting a new attempt.
    pub fn abort(&mut self) -> JobState {
        if !self.state.is_terminal() {
            self.state = JobState::Failed {
                attempts: self.attempts(),
            };
        }
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drive(max_attempts: u32, failures_before_success: u32) -> (JobState, u32) {
        let mut machine = RetryStateMachine::new(RetryPolicy::with_max_attempts(max_attempts));
        let mut fetches = 0;
        while let Some(attempt) = machine.begin_attempt() {
            fetches += 1;
            let result = if attempt > failures_before_success {
                AttemptResult::Success
            } else {
                AttemptResult::failure("boom")
            };
            machine.record(result);
        }
        (machine.state(), fetches)
    }

    #[test]
    fn test_policy_default_and_clamp() {
        assert_eq!(RetryPolicy::default().max_attempts(), 3);
        assert_eq!(RetryPolicy::with_max_attempts(0).max_attempts(), 1);
        assert_eq!(RetryPolicy::with_max_attempts(7).max_attempts(), 7);
    }

    #[test]
    fn test_starts_pending() {
        let machine = RetryStateMachine::new(RetryPolicy::default());
        assert_eq!(machine.state(), JobState::Pending);
        assert_eq!(machine.attempts(), 0);
    }

    #[test]
    fn test_first_attempt_success_stops_immediately() {
        assert_eq!(drive(3, 0), (JobState::Succeeded { attempts: 1 }, 1));
    }

    #[test]
    fn test_succeeds_on_last_allowed_attempt() {
        assert_eq!(drive(3, 2), (JobState::Succeeded { attempts: 3 }, 3));
    }

    #[test]
    fn test_fails_after_max_attempts() {
        assert_eq!(drive(3, u32::MAX), (JobState::Failed { attempts: 3 }, 3));
    }

    #[test]
    fn test_single_attempt_failure_is_terminal() {
        assert_eq!(drive(1, u32::MAX), (JobState::Failed { attempts: 1 }, 1));
    }

    #[test]
    fn test_fetch_count_always_within_bounds() {
        for max_attempts in 1..=5 {
            for failures in 0..=6 {
                let (state, fetches) = drive(max_attempts, failures);
                assert!(state.is_terminal());
                assert!((1..=max_attempts).contains(&fetches));
                if failures < max_attempts {
                    assert_eq!(fetches, failures + 1);
                    assert!(matches!(state, JobState::Succeeded { .. }));
                } else {
                    assert_eq!(state, JobState::Failed { attempts: max_attempts });
                }
            }
        }
    }

    #[test]
    fn test_retrying_state_between_attempts() {
        let mut machine = RetryStateMachine::new(RetryPolicy::with_max_attempts(3));
        assert_eq!(machine.begin_attempt(), Some(1));
        assert_eq!(machine.state(), JobState::Attempting { attempt: 1 });
        assert_eq!(
            machine.record(AttemptResult::failure("reset")),
            JobState::Retrying { attempts: 1 }
        );
        assert_eq!(machine.begin_attempt(), Some(2));
    }

    #[test]
    fn test_begin_attempt_rejected_while_attempting() {
        let mut machine = RetryStateMachine::new(RetryPolicy::default());
        assert_eq!(machine.begin_attempt(), Some(1));
        assert_eq!(machine.begin_attempt(), None);
    }

    #[test]
    fn test_record_outside_attempting_is_noop() {
        let mut machine = RetryStateMachine::new(RetryPolicy::default());
        assert_eq!(machine.record(AttemptResult::Success), JobState::Pending);

        machine.begin_attempt();
        machine.record(AttemptResult::Success);
        assert_eq!(
            machine.record(AttemptResult::failure("late")),
            JobState::Succeeded { attempts: 1 }
        );
    }

    #[test]
    fn test_abort_fails_without_extra_attempt() {
        let mut machine = RetryStateMachine::new(RetryPolicy::with_max_attempts(5));
        machine.begin_attempt();
        machine.record(AttemptResult::failure("x"));
        assert_eq!(machine.abort(), JobState::Failed { attempts: 1 });
        assert_eq!(machine.begin_attempt(), None);
    }

    #[test]
    fn test_abort_keeps_success() {
        let mut machine = RetryStateMachine::new(RetryPolicy::default());
        machine.begin_attempt();
        machine.record(AttemptResult::Success);
        assert_eq!(machine.abort(), JobState::Succeeded { attempts: 1 });
    }
}
