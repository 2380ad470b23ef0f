use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::BreakerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Calls go through to the remote collaborator.
    Closed,
    /// Calls are short-circuited until the cooldown elapses.
    Open,
    /// Cooldown elapsed; a single trial call decides whether to close or reopen.
    HalfOpen,
}

/// A circuit breaker using a sliding failure window.
///
/// It tracks failure timestamps of the remote model; once `failure_threshold`
/// failures land inside `window`, the breaker opens for `cooldown` and every
/// call goes straight to the local fallback. After the cooldown exactly one
/// trial call is let through.
#[derive(Debug)]
pub struct CircuitBreaker {
    /// Timestamps of recent failures.
    failures: Vec<Instant>,
    /// Failures within `window` that open the breaker.
    threshold: usize,
    /// The duration of the sliding window.
    window: Duration,
    /// How long the breaker stays open.
    cooldown: Duration,
    open_until: Option<Instant>,
    /// Start of the trial call while half-open.
    trial_started: Option<Instant>,
}

impl CircuitBreaker {
    pub fn new(config: &BreakerConfig) -> Self {
        CircuitBreaker {
            failures: Vec::new(),
            threshold: config.failure_threshold.max(1),
            window: config.window(),
            cooldown: config.cooldown(),
            open_until: None,
            trial_started: None,
        }
    }

    pub fn state(&self) -> BreakerState {
        match self.open_until {
            None => BreakerState::Closed,
            Some(until) if self.trial_started.is_none() && Instant::now() < until => {
                BreakerState::Open
            }
            Some(_) => BreakerState::HalfOpen,
        }
    }

    /// Checks whether a remote call may be attempted now.
    ///
    /// Once the cooldown has elapsed the first caller gets the trial call;
    /// everyone else keeps being refused until it reports back. A trial that
    /// never reports (its future was dropped) is replaced after one cooldown.
    pub fn allow(&mut self) -> bool {
        let Some(until) = self.open_until else {
            return true;
        };
        let now = Instant::now();
        match self.trial_started {
            Some(started) if now.duration_since(started) < self.cooldown => false,
            Some(_) | None if now >= until => {
                info!("Circuit breaker cooldown elapsed, trying remote model once");
                self.trial_started = Some(now);
                true
            }
            _ => false,
        }
    }

    pub fn record_success(&mut self) {
        self.failures.clear();
        if self.open_until.is_some() && self.trial_started.is_some() {
            info!("Circuit breaker closed");
            self.open_until = None;
            self.trial_started = None;
        }
    }

    pub fn record_failure(&mut self) {
        let now = Instant::now();

        if self.trial_started.take().is_some() {
            warn!(
                cooldown_ms = self.cooldown.as_millis() as u64,
                "Trial call failed, circuit breaker reopened"
            );
            self.open_until = Some(now + self.cooldown);
            return;
        }
        // Late failures from calls started before the breaker opened.
        if self.open_until.is_some() {
            return;
        }

        let window_start = now.checked_sub(self.window).unwrap_or(now);

        // Remove timestamps older than the window
        self.failures.retain(|&timestamp| timestamp > window_start);
        self.failures.push(now);

        if self.failures.len() >= self.threshold {
            warn!(
                failures = self.failures.len(),
                cooldown_ms = self.cooldown.as_millis() as u64,
                "Circuit breaker opened"
            );
            self.open_until = Some(now + self.cooldown);
            self.failures.clear();
        }
    }
}
