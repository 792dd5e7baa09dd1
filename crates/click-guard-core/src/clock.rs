//! Monotonic millisecond time sources.
//!
//! # Why monotonic? (for beginners)
//!
//! The wall clock (`SystemTime`) can jump backwards or forwards when the user
//! changes the time zone or NTP corrects drift.  A debounce window measured
//! against the wall clock could then suppress clicks for minutes, or not at
//! all.  A *monotonic* clock only ever moves forward, so "500 ms since the
//! last accepted click" always means what it says.
//!
//! # Testability
//!
//! The [`Clock`] trait lets the dispatch layer read time without knowing where
//! it comes from.  Production code uses [`MonotonicClock`]; tests use
//! [`ManualClock`] to place clicks at exact instants, or `MockClock` when they
//! need to script failures.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use thiserror::Error;

/// Error type for clock reads.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClockError {
    /// Elapsed milliseconds no longer fit in a `u64`.
    #[error("monotonic clock overflowed u64 milliseconds")]
    Overflow,

    /// The underlying time source could not be read.
    #[error("time source unavailable: {0}")]
    Unavailable(String),
}

/// A read-only source of monotonic time in milliseconds.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait Clock: Send + Sync {
    /// Returns the current time in milliseconds since an arbitrary fixed origin.
    fn now_millis(&self) -> Result<u64, ClockError>;
}

/// Clock backed by [`std::time::Instant`], counting from construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_millis(&self) -> Result<u64, ClockError> {
        u64::try_from(self.origin.elapsed().as_millis()).map_err(|_| ClockError::Overflow)
    }
}

/// A clock that only moves when told to.
///
/// Uses `AtomicU64` so a shared `Arc<ManualClock>` can be advanced from a test
/// while the dispatch layer reads it.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Creates a clock that reads `start_millis`.
    pub fn new(start_millis: u64) -> Self {
        Self {
            now: AtomicU64::new(start_millis),
        }
    }

    /// Jumps to an absolute time.
    pub fn set(&self, millis: u64) {
        self.now.store(millis, Ordering::SeqCst);
    }

    /// Moves forward by `millis` and returns the new time.
    pub fn advance(&self, millis: u64) -> u64 {
        self.now.fetch_add(millis, Ordering::SeqCst) + millis
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> Result<u64, ClockError> {
        Ok(self.now.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_clock_never_goes_backwards() {
        // Arrange
        let clock = MonotonicClock::new();

        // Act
        let first = clock.now_millis().unwrap();
        let second = clock.now_millis().unwrap();

        // Assert
        assert!(second >= first);
    }

    #[test]
    fn test_monotonic_clock_starts_near_zero() {
        let clock = MonotonicClock::new();
        assert!(clock.now_millis().unwrap() < 1_000);
    }

    #[test]
    fn test_manual_clock_reads_what_was_set() {
        let clock = ManualClock::new(42);
        assert_eq!(clock.now_millis(), Ok(42));
        clock.set(1_000);
        assert_eq!(clock.now_millis(), Ok(1_000));
    }

    #[test]
    fn test_manual_clock_advance_returns_new_time() {
        // Arrange
        let clock = ManualClock::new(100);

        // Act
        let now = clock.advance(250);

        // Assert
        assert_eq!(now, 350);
        assert_eq!(clock.now_millis(), Ok(350));
    }

    #[test]
    fn test_mock_clock_can_script_a_failure() {
        // Arrange
        let mut clock = MockClock::new();
        clock
            .expect_now_millis()
            .returning(|| Err(ClockError::Unavailable("suspended".to_string())));

        // Act / Assert
        assert!(matches!(clock.now_millis(), Err(ClockError::Unavailable(_))));
    }
}
