//! Monotonic nanosecond clock plus a wall-clock anchor for rendering
//! monotonic readings to `(seconds, nanos)` timestamps while preserving
//! intra-trace ordering.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// A wall-clock timestamp as `(seconds, nanos)`, matching the wire format.
#[derive(Clone, Copy, PartialEq, Eq, Debug, serde::Serialize)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: i32,
}

impl Timestamp {
    pub fn to_chrono(self) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp(self.seconds, self.nanos.max(0) as u32)
            .unwrap_or(chrono::DateTime::<chrono::Utc>::UNIX_EPOCH)
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        (self.seconds, self.nanos).cmp(&(other.seconds, other.nanos))
    }
}

/// A source of monotonic nanosecond readings. Implementors must be
/// thread-safe; the default `SystemClock` wraps `std::time::Instant`.
pub trait Clock: Send + Sync {
    fn now_nanos(&self) -> i64;
}

/// Production clock: monotonic nanoseconds since an arbitrary process-local
/// epoch anchored at construction.
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_nanos(&self) -> i64 {
        self.epoch.elapsed().as_nanos() as i64
    }
}

/// A deterministic clock for tests: starts at 0 and only advances when
/// told to, via `advance` / `set`.
pub struct TestClock {
    nanos: AtomicI64,
}

impl TestClock {
    pub fn new() -> Self {
        TestClock {
            nanos: AtomicI64::new(0),
        }
    }

    pub fn at(start_nanos: i64) -> Self {
        TestClock {
            nanos: AtomicI64::new(start_nanos),
        }
    }

    pub fn advance(&self, delta_nanos: i64) {
        self.nanos.fetch_add(delta_nanos, Ordering::SeqCst);
    }

    pub fn set(&self, nanos: i64) {
        self.nanos.store(nanos, Ordering::SeqCst);
    }
}

impl Default for TestClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TestClock {
    fn now_nanos(&self) -> i64 {
        self.nanos.load(Ordering::SeqCst)
    }
}

/// Captures one `(wall, monotonic)` anchor pair at construction and
/// converts later monotonic readings into wall-clock timestamps, so that
/// spans sharing a parent's converter stay ordered even if the system wall
/// clock jitters between conversions.
pub struct TimestampConverter {
    wall_anchor_nanos: i64,
    mono_anchor_nanos: i64,
}

impl TimestampConverter {
    /// Anchors at the given monotonic reading, using the real wall clock
    /// for the wall-side anchor.
    pub fn new(mono_now_nanos: i64) -> Self {
        let wall_nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as i64)
            .unwrap_or(0);
        TimestampConverter {
            wall_anchor_nanos: wall_nanos,
            mono_anchor_nanos: mono_now_nanos,
        }
    }

    /// For tests: pins the wall anchor to an exact value instead of reading
    /// the real wall clock.
    pub fn with_wall_anchor(mono_now_nanos: i64, wall_anchor_nanos: i64) -> Self {
        TimestampConverter {
            wall_anchor_nanos,
            mono_anchor_nanos: mono_now_nanos,
        }
    }

    pub fn convert(&self, mono_nanos: i64) -> Timestamp {
        let delta = mono_nanos - self.mono_anchor_nanos;
        let wall_nanos = self.wall_anchor_nanos + delta;
        Timestamp {
            seconds: wall_nanos.div_euclid(1_000_000_000),
            nanos: wall_nanos.rem_euclid(1_000_000_000) as i32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converter_preserves_ordering_across_monotonic_deltas() {
        let conv = TimestampConverter::with_wall_anchor(1_000_000_000, 1_000_000_000_000);
        let t0 = conv.convert(1_000_000_000);
        let t1 = conv.convert(2_000_000_000);
        assert!(t1 > t0);
        assert_eq!(t1.seconds - t0.seconds, 1);
    }

    #[test]
    fn test_clock_only_advances_when_told() {
        let clock = TestClock::new();
        assert_eq!(clock.now_nanos(), 0);
        clock.advance(500);
        assert_eq!(clock.now_nanos(), 500);
    }

    #[test]
    fn to_chrono_round_trips_seconds_and_nanos() {
        use chrono::{Datelike, Timelike};
        let ts = Timestamp {
            seconds: 1_700_000_000,
            nanos: 123_000_000,
        };
        let dt = ts.to_chrono();
        assert_eq!(dt.year(), 2023);
        assert_eq!(dt.timestamp(), ts.seconds);
        assert_eq!(dt.nanosecond(), ts.nanos as u32);
    }
}
