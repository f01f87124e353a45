//! Adaptive request pacing and cooldown escalation.
//!
//! The target registry defends against automated traffic with a
//! rate-counting WAF: sustained request rates above a threshold, or bursts
//! after failures, trigger blocking. [`ThrottleController`] keeps the
//! global request rate under that threshold with three layers:
//!
//! 1. a jittered per-request delay that grows with consecutive failures,
//! 2. a short cooldown once enough failures accumulate in the current
//!    window (lets the short-term rate counter reset),
//! 3. a long cooldown on sustained consecutive failures (lets the sliding
//!    window reset; the caller must also refresh its session).
//!
//! The controller is a pure state machine: [`ThrottleController::report`]
//! never sleeps, it only returns which cooldown tier fired. Callers own the
//! actual waiting, so tests can drive the state machine without timing.

use rand::Rng;
use regscout_core::ThrottleProfile;
use std::time::{Duration, Instant};

/// A cooldown tier signalled by [`ThrottleController::report`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cooldown {
    /// Short pause; the remote's short-term failure window has filled.
    Short(Duration),
    /// Long pause; sustained failures suggest the sliding-window defense
    /// has latched. The caller should refresh its session before resuming.
    Long(Duration),
}

impl Cooldown {
    /// How long to pause.
    #[must_use]
    pub fn duration(&self) -> Duration {
        match self {
            Self::Short(d) | Self::Long(d) => *d,
        }
    }

    /// Whether the caller should refresh its session/cookies before
    /// resuming.
    #[must_use]
    pub fn requires_session_refresh(&self) -> bool {
        matches!(self, Self::Long(_))
    }
}

/// Paces outbound requests and escalates cooldowns on observed failures.
///
/// One controller instance governs all traffic for a stage; requests are
/// strictly sequential, so the controller reasons about a global rate.
#[derive(Debug)]
pub struct ThrottleController {
    profile: ThrottleProfile,
    consecutive_failures: u32,
    failures_in_window: u32,
    last_request: Option<Instant>,
}

impl ThrottleController {
    /// Create a controller from a pacing profile.
    #[must_use]
    pub fn new(profile: ThrottleProfile) -> Self {
        Self {
            profile,
            consecutive_failures: 0,
            failures_in_window: 0,
            last_request: None,
        }
    }

    /// Current consecutive failure count.
    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// The delay to honor before the next request: base plus an adaptive
    /// increment per consecutive failure, perturbed by bounded jitter and
    /// clamped to the floor.
    #[must_use]
    pub fn next_delay(&self) -> Duration {
        let jitter = if self.profile.jitter_secs > 0.0 {
            rand::thread_rng().gen_range(-self.profile.jitter_secs..=self.profile.jitter_secs)
        } else {
            0.0
        };
        self.delay_with_jitter(jitter)
    }

    fn delay_with_jitter(&self, jitter: f64) -> Duration {
        let adaptive =
            self.profile.failure_increment_secs * f64::from(self.consecutive_failures);
        let delay = (self.profile.base_delay_secs + adaptive + jitter)
            .max(self.profile.floor_secs)
            .max(0.0);
        Duration::from_secs_f64(delay)
    }

    /// Block until enough time has passed since the previous request.
    ///
    /// The first request goes out immediately; every later request waits
    /// for whatever remains of [`Self::next_delay`] measured from the last
    /// request.
    pub async fn before_request(&mut self) {
        if let Some(last) = self.last_request {
            let target = self.next_delay();
            let elapsed = last.elapsed();
            if elapsed < target {
                let wait = target - elapsed;
                tracing::debug!(
                    wait_secs = wait.as_secs_f64(),
                    consecutive_failures = self.consecutive_failures,
                    "throttling before request"
                );
                tokio::time::sleep(wait).await;
            }
        }
        self.last_request = Some(Instant::now());
    }

    /// Record the outcome of a request.
    ///
    /// Success resets both failure counters. Failure increments them and
    /// may fire a cooldown tier: the long tier when consecutive failures
    /// reach its threshold (both counters reset, session refresh expected),
    /// otherwise the short tier when the window fills (window resets).
    /// The caller is expected to sleep for the returned duration.
    pub fn report(&mut self, success: bool) -> Option<Cooldown> {
        if success {
            self.consecutive_failures = 0;
            self.failures_in_window = 0;
            return None;
        }

        self.consecutive_failures += 1;
        self.failures_in_window += 1;

        if self.profile.long_cooldown_threshold > 0
            && self.consecutive_failures >= self.profile.long_cooldown_threshold
        {
            tracing::warn!(
                consecutive = self.consecutive_failures,
                cooldown_secs = self.profile.long_cooldown_secs,
                "long cooldown: sustained failures, session refresh required"
            );
            self.consecutive_failures = 0;
            self.failures_in_window = 0;
            return Some(Cooldown::Long(Duration::from_secs(
                self.profile.long_cooldown_secs,
            )));
        }

        if self.profile.short_cooldown_threshold > 0
            && self.failures_in_window >= self.profile.short_cooldown_threshold
        {
            tracing::warn!(
                in_window = self.failures_in_window,
                cooldown_secs = self.profile.short_cooldown_secs,
                "short cooldown: failure window filled"
            );
            self.failures_in_window = 0;
            return Some(Cooldown::Short(Duration::from_secs(
                self.profile.short_cooldown_secs,
            )));
        }

        None
    }
}
