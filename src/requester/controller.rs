//! Retry/backoff controller
//!
//! Tracks consecutive failures on the current proxy and decides, for every
//! classified failure, whether to throttle and retry on the same proxy or to
//! rotate to a new one.
//!
//! # Policy
//!
//! | Classification | Action |
//! |----------------|--------|
//! | HTTP 429 | Rotate immediately, reset counter |
//! | Too many redirects | Rotate immediately, reset counter |
//! | Other HTTP >= 400 | Count; rotate at threshold, else throttle |
//! | Transport / timeout / parse | Count; rotate at threshold, else throttle |
//!
//! The controller performs no I/O. It returns a [`Remediation`] and the cycle
//! driver carries it out.

use crate::requester::FailureKind;
use rand::Rng;
use std::time::Duration;

/// Controller lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Requesting,
    Success,
    Failed,
}

/// What to do before the next attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remediation {
    /// Discard the current proxy and draw a new one
    Rotate { reason: FailureKind },

    /// Sleep, then retry with the same proxy
    Throttle(Duration),
}

/// Failure counter and remediation policy
pub struct RetryController<R> {
    threshold: u32,
    average_wait: Duration,
    consecutive_failures: u32,
    state: ControllerState,
    rng: R,
}

impl<R: Rng> RetryController<R> {
    /// Creates a controller
    ///
    /// # Arguments
    ///
    /// * `threshold` - Consecutive non-forcing failures tolerated before rotating
    /// * `average_wait` - Mean throttle wait; draws fall in `[0.5x, 1.5x]`
    /// * `rng` - Random source for throttle draws
    pub fn new(threshold: u32, average_wait: Duration, rng: R) -> Self {
        Self {
            threshold,
            average_wait,
            consecutive_failures: 0,
            state: ControllerState::Idle,
            rng,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Marks the start of a request
    pub fn begin_attempt(&mut self) {
        self.state = ControllerState::Requesting;
    }

    /// Records a successful cycle, resetting the failure counter
    pub fn record_success(&mut self) {
        self.state = ControllerState::Success;
        self.reset_consecutive_failures();
        self.state = ControllerState::Idle;
    }

    /// Applies the policy table to a classified failure
    pub fn on_failure(&mut self, kind: FailureKind) -> Remediation {
        self.state = ControllerState::Failed;

        if kind.forces_rotation() {
            tracing::info!("{}; rotating proxy immediately", kind);
            self.reset_consecutive_failures();
            return Remediation::Rotate { reason: kind };
        }

        self.consecutive_failures += 1;
        tracing::warn!(
            "Page retrieval failed ({}). This is the {} consecutive failure with the current proxy.",
            kind,
            ordinal(self.consecutive_failures)
        );

        if self.consecutive_failures >= self.threshold {
            tracing::info!("Too many consecutive failures; rotating proxy");
            self.reset_consecutive_failures();
            Remediation::Rotate { reason: kind }
        } else {
            Remediation::Throttle(self.throttle_duration())
        }
    }

    /// Draws a throttle wait uniformly from `[0.5 * average, 1.5 * average]`
    ///
    /// An average of zero always yields zero.
    pub fn throttle_duration(&mut self) -> Duration {
        let average = self.average_wait.as_secs_f64();
        if average <= 0.0 {
            return Duration::ZERO;
        }

        let secs = self.rng.gen_range(average * 0.5..=average * 1.5);
        Duration::try_from_secs_f64(secs).unwrap_or(self.average_wait)
    }

    fn reset_consecutive_failures(&mut self) {
        if self.consecutive_failures > 0 {
            self.consecutive_failures = 0;
            tracing::info!("Consecutive failures reset to 0");
        }
    }
}

/// Formats 1 as "1st", 2 as "2nd", 11 as "11th" and so on
pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}
