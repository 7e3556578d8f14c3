//! Retry budget for token acquisition
//!
//! A bounded attempt counter with a fixed inter-attempt delay. One budget
//! covers one token-fetch sequence and is dropped when the sequence ends.

use std::time::Duration;

/// Bounded attempt counter with a fixed delay between attempts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryBudget {
    max_attempts: u32,
    delay: Duration,
    attempts: u32,
}

impl RetryBudget {
    /// Creates a budget; `max_attempts` is clamped to at least 1
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            attempts: 0,
        }
    }

    /// Consumes one attempt, returning false if none are left
    pub fn try_begin_attempt(&mut self) -> bool {
        if self.is_exhausted() {
            return false;
        }
        self.attempts += 1;
        true
    }

    /// Attempts consumed so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Attempts still available
    pub fn remaining(&self) -> u32 {
        self.max_attempts - self.attempts
    }

    /// Returns true once every attempt has been consumed
    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    /// Fixed delay between attempts
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Upper bound on attempts
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}
