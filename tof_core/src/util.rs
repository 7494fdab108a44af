//! Common time and unit helpers for tof_core.

use std::time::{Duration, Instant};

/// Number of millimetres in one metre.
pub const MM_PER_M: f32 = 1_000.0;

/// Polling period as a `Duration`, clamped to at least 1 ms.
#[inline]
pub fn period(period_ms: u64) -> Duration {
    Duration::from_millis(period_ms.max(1))
}

/// Next fixed-rate deadline after `prev`.
///
/// Deadlines advance by exactly one period so jitter does not accumulate.
/// After an overrun longer than a full period the schedule is re-anchored
/// at `now` instead of firing a burst of catch-up polls.
#[inline]
pub fn next_deadline(prev: Instant, period: Duration, now: Instant) -> Instant {
    let next = prev + period;
    if next + period <= now { now } else { next }
}

#[inline]
pub fn mm_to_m(mm: u16) -> f32 {
    f32::from(mm) / MM_PER_M
}
