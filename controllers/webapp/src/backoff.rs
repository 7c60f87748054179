//! # Fibonacci Backoff
//!
//! Retry delays for failed reconciliations. Delays grow along the Fibonacci
//! sequence, which backs off more gently than doubling, and are capped.
//! Sequence with the controller defaults: 2s, 2s, 4s, 6s, 10s, ... 120s (max).

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Fibonacci backoff calculator
///
/// Each delay is the sum of the previous two, starting from `min_seconds`
/// twice and never exceeding `max_seconds`.
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    min_seconds: u64,
    prev_seconds: u64,
    current_seconds: u64,
    max_seconds: u64,
}

impl FibonacciBackoff {
    #[must_use]
    pub fn new(min_seconds: u64, max_seconds: u64) -> Self {
        Self {
            min_seconds,
            prev_seconds: 0,
            current_seconds: min_seconds,
            max_seconds,
        }
    }

    /// Returns the next delay in seconds and advances the sequence.
    pub fn next_backoff_seconds(&mut self) -> u64 {
        let result = self.current_seconds;

        let next = self.prev_seconds + self.current_seconds;
        self.prev_seconds = self.current_seconds;
        self.current_seconds = std::cmp::min(next, self.max_seconds);

        result
    }

    /// Returns the next delay and advances the sequence.
    pub fn next_backoff(&mut self) -> Duration {
        Duration::from_secs(self.next_backoff_seconds())
    }

    /// Reset the backoff to the initial state
    pub fn reset(&mut self) {
        self.prev_seconds = 0;
        self.current_seconds = self.min_seconds;
    }
}

/// Independent backoff sequences keyed by object.
///
/// One WebApp failing repeatedly does not slow down retries of another.
#[derive(Debug)]
pub struct BackoffTracker {
    min_seconds: u64,
    max_seconds: u64,
    entries: Mutex<HashMap<String, FibonacciBackoff>>,
}

impl BackoffTracker {
    #[must_use]
    pub fn new(min_seconds: u64, max_seconds: u64) -> Self {
        Self {
            min_seconds,
            max_seconds,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Next delay for `key`, advancing its sequence.
    pub fn next_backoff(&self, key: &str) -> Duration {
        let mut entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries
            .entry(key.to_string())
            .or_insert_with(|| FibonacciBackoff::new(self.min_seconds, self.max_seconds))
            .next_backoff()
    }

    /// Forgets the sequence for `key` after a successful reconciliation.
    pub fn reset(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.remove(key);
    }
}
