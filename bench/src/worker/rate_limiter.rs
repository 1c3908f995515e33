use std::time::Duration;

use tokio::time::Instant;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Per worker pacing towards a target rate.
///
/// The limiter compares the number of sends against how many the elapsed time allows and only suspends a worker
/// that is ahead of schedule. A worker that fell behind (slow node, slow signing) catches up without sleeping, so
/// slow periods never compound.
#[derive(Debug)]
pub struct RateLimiter {
    rate_per_second: u64,
    started: Instant,
    sent: u64,
}

impl RateLimiter {
    /// Starts the clock. A rate of `0` disables pacing.
    pub fn new(rate_per_second: u64) -> Self {
        Self { rate_per_second, started: Instant::now(), sent: 0 }
    }

    pub fn is_unlimited(&self) -> bool {
        self.rate_per_second == 0
    }

    pub fn sent(&self) -> u64 {
        self.sent
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Counts one send and returns how long the worker must pause to stay on schedule.
    pub fn record_send(&mut self) -> Option<Duration> {
        self.sent += 1;
        self.delay(self.started.elapsed())
    }

    /// Time by which `sent` is ahead of `elapsed * rate`, if any.
    ///
    /// `deficit = sent - elapsed * rate`, and the pause is `deficit / rate`, which is `sent / rate - elapsed`.
    pub fn delay(&self, elapsed: Duration) -> Option<Duration> {
        if self.is_unlimited() {
            return None;
        }
        let due = u128::from(self.sent) * NANOS_PER_SEC / u128::from(self.rate_per_second);
        let elapsed = elapsed.as_nanos();
        if due <= elapsed {
            return None;
        }
        let wait = u64::try_from(due - elapsed).unwrap_or(u64::MAX);
        Some(Duration::from_nanos(wait))
    }
}
