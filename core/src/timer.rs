//! Monotonic microsecond timer
//! Interval measurement only, never time-of-day

use std::sync::OnceLock;
use std::time::Instant;

/// Opaque monotonic instant in microseconds.
///
/// Only the difference between two timestamps carries meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const fn from_micros(us: u64) -> Self {
        Self(us)
    }

    pub const fn as_micros(self) -> u64 {
        self.0
    }
}

/// Microseconds between two timestamps, clamped at zero.
#[inline(always)]
pub fn elapsed(start: Timestamp, end: Timestamp) -> u64 {
    end.0.saturating_sub(start.0)
}

/// Source of monotonic timestamps
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Production clock backed by `Instant`.
///
/// All readings share one process-wide anchor, so timestamps taken through
/// different `MonotonicClock` values are comparable.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

fn anchor() -> Instant {
    static ANCHOR: OnceLock<Instant> = OnceLock::new();
    *ANCHOR.get_or_init(Instant::now)
}

impl Clock for MonotonicClock {
    #[inline(always)]
    fn now(&self) -> Timestamp {
        Timestamp(anchor().elapsed().as_micros() as u64)
    }
}

/// Shorthand for `MonotonicClock.now()`
#[inline(always)]
pub fn now() -> Timestamp {
    MonotonicClock.now()
}
