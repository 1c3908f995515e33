use std::ops::Range;

use crate::types::plan::PlanError;

/// Splits a run's nonce space into one contiguous, equally sized range per worker.
///
/// Ranges are fixed before any worker starts, so workers sharing a signing account never need to agree on nonces
/// at runtime. The remainder `total % workers` is never emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonceAllocator {
    start_nonce: u32,
    workers: u32,
    per_worker: u64,
    total: u64,
}

impl NonceAllocator {
    pub fn new(total: u64, workers: u32, start_nonce: u32) -> Result<Self, PlanError> {
        if workers == 0 {
            return Err(PlanError::NoWorkers);
        }
        let per_worker = total / u64::from(workers);
        // One past the highest nonce handed out must still be reachable from a u32 start.
        let end = u64::from(start_nonce) + per_worker * u64::from(workers);
        if end > u64::from(u32::MAX) + 1 {
            return Err(PlanError::NonceOverflow { start_nonce, required: end - 1 });
        }
        Ok(Self { start_nonce, workers, per_worker, total })
    }

    pub fn workers(&self) -> u32 {
        self.workers
    }

    pub fn per_worker(&self) -> u64 {
        self.per_worker
    }

    /// Volume lost to the floor division.
    pub fn dropped(&self) -> u64 {
        self.total % u64::from(self.workers)
    }

    pub fn range(&self, worker: u32) -> Range<u64> {
        let start = u64::from(self.start_nonce) + u64::from(worker) * self.per_worker;
        start..start + self.per_worker
    }

    /// First nonce of `worker`. Only meaningful for `worker < workers`.
    pub fn range_start(&self, worker: u32) -> u32 {
        u32::try_from(self.range(worker).start).unwrap_or(u32::MAX)
    }
}

/// Strictly sequential nonces for one worker. Every call to [`NonceSequence::next`] consumes a value, whatever
/// happens to the transaction that carries it.
#[derive(Debug, Clone)]
pub struct NonceSequence {
    next: u64,
    end: u64,
}

impl NonceSequence {
    pub fn new(start: u32, count: u64) -> Self {
        let next = u64::from(start);
        Self { next, end: next.saturating_add(count) }
    }

    /// The nonce the next call would return, or one past the last nonce once exhausted.
    pub fn peek(&self) -> u64 {
        self.next
    }

    pub fn remaining(&self) -> u64 {
        self.end - self.next
    }
}

impl Iterator for NonceSequence {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.next >= self.end {
            return None;
        }
        let nonce = u32::try_from(self.next).ok()?;
        self.next += 1;
        Some(nonce)
    }
}
