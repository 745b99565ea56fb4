//! Bounded retry with exponential backoff.

use std::time::Duration;

pub const DEFAULT_MAX_RETRIES: u32 = 4;
pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

/// Blocks the current thread between attempts.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Sleeps with [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Position of an attempt inside a retry run, 1-based for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    pub number: u32,
    pub total: u32,
}

#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

/// `max_retries` additional attempts after the first failure, waiting
/// `backoff_factor ^ i` seconds after the i-th failed attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_factor: f64) -> Self {
        RetryPolicy {
            max_retries,
            backoff_factor,
        }
    }

    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay after the failed attempt with 0-based index `retry_index`.
    /// Saturates at [`Duration::MAX`] when the backoff overflows.
    pub fn delay_for(&self, retry_index: u32) -> Duration {
        let exponent = i32::try_from(retry_index).unwrap_or(i32::MAX);
        let secs = self.backoff_factor.powi(exponent);
        if secs.is_nan() || secs <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }

    /// Runs `op` until it succeeds or the attempts are used up. No sleep
    /// happens before the first attempt or after the last one.
    pub fn run<T, E, S, F>(&self, sleeper: &S, mut op: F) -> Result<T, RetryExhausted<E>>
    where
        S: Sleeper + ?Sized,
        F: FnMut(Attempt) -> Result<T, E>,
    {
        let total = self.total_attempts();
        let mut index = 0;
        loop {
            let attempt = Attempt {
                number: index + 1,
                total,
            };
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(e) if index == self.max_retries => {
                    return Err(RetryExhausted {
                        attempts: total,
                        last_error: e,
                    })
                }
                Err(_) => {
                    let delay = self.delay_for(index);
                    log::debug!(
                        "Waiting {:.1}s before attempt {}/{}",
                        delay.as_secs_f64(),
                        index + 2,
                        total
                    );
                    sleeper.sleep(delay);
                }
            }
            index += 1;
        }
    }
}
