//! Debounce Guard: decides whether a click on a target is accepted or dropped.
//!
//! The guard keeps a side-table from target identity to [`SuppressionState`]
//! (the time of the last accepted click).  A click is accepted when the target
//! has never been clicked, or when at least `threshold` milliseconds have
//! passed since the last accepted click.  Rejected clicks leave the state
//! untouched, so a steady stream of rapid clicks cannot extend the window.
//!
//! ```text
//! accepted at t0
//!   │◄──────── threshold ────────►│
//!   t0 ....... rejected ......... t0+threshold (accepted again)
//! ```
//!
//! # Target identity
//!
//! Entries are keyed by the address of the target's `Arc` allocation and hold
//! a `Weak` back to it.  The `Weak` keeps the allocation itself reserved, so
//! the address cannot be handed to a different view while the entry exists.
//! Once the host drops the view, the entry is dead and is removed by the next
//! purge.
//!
//! # Thread safety
//!
//! The read-then-write on the last accepted timestamp happens under one
//! `Mutex`, so two concurrent clicks on the same target can never both observe
//! a stale timestamp and both be accepted.
//!
//! A decision never leaves the side-table half-written, so a poisoned lock is
//! recovered: the call that observes the poison reports
//! [`GuardError::StatePoisoned`], and later calls see the table as it was.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::view::View;

/// Minimum gap between two accepted clicks on the same target.
pub const DEFAULT_THRESHOLD: Duration = Duration::from_millis(500);

/// Dead entries are swept once the table reaches this size (and then double it).
const MIN_PURGE_WATERMARK: usize = 64;

/// Error type for guard evaluation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GuardError {
    /// A thread panicked while holding the side-table lock.  Only the call
    /// that first observes the poison gets this error.
    #[error("suppression state lock was poisoned")]
    StatePoisoned,
}

/// Per-target timing state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SuppressionState {
    last_accepted_at_millis: Option<u64>,
}

impl SuppressionState {
    /// Time of the last accepted click, or `None` if none was recorded yet.
    pub fn last_accepted_at_millis(&self) -> Option<u64> {
        self.last_accepted_at_millis
    }

    fn try_accept(&mut self, now_millis: u64, threshold_millis: u64) -> bool {
        let accept = match self.last_accepted_at_millis {
            None => true,
            // A clock reading earlier than the last accept counts as no time elapsed.
            Some(last) => now_millis.saturating_sub(last) >= threshold_millis,
        };
        if accept {
            self.last_accepted_at_millis = Some(now_millis);
        }
        accept
    }
}

struct Entry {
    owner: Weak<View>,
    state: SuppressionState,
}

impl Entry {
    fn is_live(&self) -> bool {
        self.owner.strong_count() > 0
    }
}

struct SideTable {
    entries: HashMap<usize, Entry>,
    purge_watermark: usize,
}

impl SideTable {
    fn purge(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.is_live());
        before - self.entries.len()
    }
}

/// Decides, per target, whether a click is accepted or suppressed.
pub struct DebounceGuard {
    threshold_millis: u64,
    table: Mutex<SideTable>,
}

impl DebounceGuard {
    /// Creates a guard with the given minimum gap between accepted clicks.
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold_millis: u64::try_from(threshold.as_millis()).unwrap_or(u64::MAX),
            table: Mutex::new(SideTable {
                entries: HashMap::new(),
                purge_watermark: MIN_PURGE_WATERMARK,
            }),
        }
    }

    /// Returns the configured minimum gap between accepted clicks.
    pub fn threshold(&self) -> Duration {
        Duration::from_millis(self.threshold_millis)
    }

    /// Decides whether a click on `target` at `now_millis` should be forwarded.
    ///
    /// The first click ever seen for a target is always accepted.  Later
    /// clicks are accepted when `now_millis - last_accepted >= threshold`
    /// (inclusive).  Only an accept updates the stored timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::StatePoisoned`] if the side-table lock is poisoned.
    pub fn should_accept(&self, target: &Arc<View>, now_millis: u64) -> Result<bool, GuardError> {
        let mut table = self.lock()?;
        let key = target_key(target);

        let accepted = match table.entries.get_mut(&key) {
            Some(entry) => entry.state.try_accept(now_millis, self.threshold_millis),
            None => {
                let mut state = SuppressionState::default();
                let accepted = state.try_accept(now_millis, self.threshold_millis);
                table.entries.insert(
                    key,
                    Entry {
                        owner: Arc::downgrade(target),
                        state,
                    },
                );
                if table.entries.len() >= table.purge_watermark {
                    let removed = table.purge();
                    table.purge_watermark = (table.entries.len() * 2).max(MIN_PURGE_WATERMARK);
                    if removed > 0 {
                        debug!(removed, "purged state of dropped click targets");
                    }
                }
                accepted
            }
        };
        Ok(accepted)
    }

    /// Returns the stored state for `target`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::StatePoisoned`] if the side-table lock is poisoned.
    pub fn state_of(&self, target: &Arc<View>) -> Result<Option<SuppressionState>, GuardError> {
        let table = self.lock()?;
        Ok(table.entries.get(&target_key(target)).map(|e| e.state))
    }

    /// Drops the state for `target` so its next click counts as a first click.
    ///
    /// Returns `true` if an entry was removed.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::StatePoisoned`] if the side-table lock is poisoned.
    pub fn forget(&self, target: &Arc<View>) -> Result<bool, GuardError> {
        let mut table = self.lock()?;
        Ok(table.entries.remove(&target_key(target)).is_some())
    }

    /// Removes the entries of every target the host has dropped.
    ///
    /// Returns the number of entries removed.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::StatePoisoned`] if the side-table lock is poisoned.
    pub fn purge_reclaimed(&self) -> Result<usize, GuardError> {
        let mut table = self.lock()?;
        Ok(table.purge())
    }

    /// Number of entries in the side-table, including dead ones not yet purged.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::StatePoisoned`] if the side-table lock is poisoned.
    pub fn tracked_targets(&self) -> Result<usize, GuardError> {
        Ok(self.lock()?.entries.len())
    }

    fn lock(&self) -> Result<MutexGuard<'_, SideTable>, GuardError> {
        self.table.lock().map_err(|poisoned| {
            drop(poisoned.into_inner());
            self.table.clear_poison();
            warn!("suppression state lock was poisoned; cleared for later calls");
            GuardError::StatePoisoned
        })
    }
}

impl Default for DebounceGuard {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

fn target_key(target: &Arc<View>) -> usize {
    Arc::as_ptr(target) as usize
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn accept_pattern(guard: &DebounceGuard, target: &Arc<View>, times: &[u64]) -> Vec<bool> {
        times
            .iter()
            .map(|&t| guard.should_accept(target, t).unwrap())
            .collect()
    }

    // ── Decision rule ─────────────────────────────────────────────────────────

    #[test]
    fn test_first_click_on_fresh_target_is_accepted() {
        // Arrange
        let guard = DebounceGuard::default();
        let view = View::new("x");

        // Act
        let accepted = guard.should_accept(&view, 12_345).unwrap();

        // Assert
        assert!(accepted);
        assert_eq!(
            guard.state_of(&view).unwrap().unwrap().last_accepted_at_millis(),
            Some(12_345)
        );
    }

    #[test]
    fn test_first_click_at_time_zero_is_accepted() {
        let guard = DebounceGuard::default();
        let view = View::new("x");
        assert!(guard.should_accept(&view, 0).unwrap());
    }

    #[test]
    fn test_clicks_inside_window_are_rejected() {
        // Arrange
        let guard = DebounceGuard::default();
        let view = View::new("x");
        guard.should_accept(&view, 1_000).unwrap();

        // Act / Assert – every t in (t0, t0 + 500) is rejected
        for t in [1_001, 1_100, 1_250, 1_499] {
            assert!(!guard.should_accept(&view, t).unwrap(), "t={t} must be rejected");
        }
    }

    #[test]
    fn test_rejected_click_does_not_move_the_window() {
        // Arrange
        let guard = DebounceGuard::default();
        let view = View::new("x");
        guard.should_accept(&view, 0).unwrap();

        // Act
        guard.should_accept(&view, 499).unwrap();

        // Assert
        assert_eq!(
            guard.state_of(&view).unwrap().unwrap().last_accepted_at_millis(),
            Some(0)
        );
        assert!(guard.should_accept(&view, 500).unwrap());
    }

    #[test]
    fn test_click_exactly_at_threshold_is_accepted() {
        let guard = DebounceGuard::default();
        let view = View::new("x");
        guard.should_accept(&view, 2_000).unwrap();
        assert!(guard.should_accept(&view, 2_500).unwrap());
    }

    #[test]
    fn test_rapid_burst_scenario() {
        // 1_000 is only 400 ms after the accept at 600
        let guard = DebounceGuard::default();
        let view = View::new("x");
        assert_eq!(
            accept_pattern(&guard, &view, &[0, 100, 400, 600, 1_000, 1_100]),
            vec![true, false, false, true, false, true]
        );
    }

    #[test]
    fn test_window_restarts_from_boundary_accept() {
        // 999 - 500 = 499 < 500
        let guard = DebounceGuard::default();
        let view = View::new("x");
        assert_eq!(
            accept_pattern(&guard, &view, &[0, 500, 999]),
            vec![true, true, false]
        );
    }

    #[test]
    fn test_targets_are_independent() {
        // Arrange
        let guard = DebounceGuard::default();
        let x = View::new("x");
        let y = View::new("y");

        // Act
        let x_first = guard.should_accept(&x, 0).unwrap();
        let y_first = guard.should_accept(&y, 0).unwrap();
        let x_again = guard.should_accept(&x, 10).unwrap();

        // Assert
        assert!(x_first);
        assert!(y_first);
        assert!(!x_again);
    }

    #[test]
    fn test_clock_reading_before_last_accept_is_rejected() {
        let guard = DebounceGuard::default();
        let view = View::new("x");
        guard.should_accept(&view, 10_000).unwrap();
        assert!(!guard.should_accept(&view, 9_000).unwrap());
    }

    #[test]
    fn test_custom_threshold_is_respected() {
        // Arrange
        let guard = DebounceGuard::new(Duration::from_millis(100));
        let view = View::new("x");

        // Act / Assert
        assert_eq!(guard.threshold(), Duration::from_millis(100));
        assert_eq!(
            accept_pattern(&guard, &view, &[0, 99, 100, 150, 200]),
            vec![true, false, true, false, true]
        );
    }

    // ── Side-table maintenance ────────────────────────────────────────────────

    #[test]
    fn test_forget_makes_next_click_a_first_click() {
        // Arrange
        let guard = DebounceGuard::default();
        let view = View::new("x");
        guard.should_accept(&view, 0).unwrap();

        // Act
        let removed = guard.forget(&view).unwrap();

        // Assert
        assert!(removed);
        assert!(guard.should_accept(&view, 1).unwrap());
    }

    #[test]
    fn test_purge_removes_only_dropped_targets() {
        // Arrange
        let guard = DebounceGuard::default();
        let kept = View::new("kept");
        let dropped = View::new("dropped");
        guard.should_accept(&kept, 0).unwrap();
        guard.should_accept(&dropped, 0).unwrap();

        // Act
        drop(dropped);
        let removed = guard.purge_reclaimed().unwrap();

        // Assert
        assert_eq!(removed, 1);
        assert_eq!(guard.tracked_targets().unwrap(), 1);
        assert!(guard.state_of(&kept).unwrap().is_some());
    }

    #[test]
    fn test_table_is_swept_automatically_when_it_grows() {
        // Arrange
        let guard = DebounceGuard::default();

        // Act – click many short-lived views; each is dropped right after
        for i in 0..(MIN_PURGE_WATERMARK * 4) {
            let view = View::new(format!("transient-{i}"));
            guard.should_accept(&view, i as u64).unwrap();
        }

        // Assert – dead entries never pile up past the watermark
        assert!(guard.tracked_targets().unwrap() < MIN_PURGE_WATERMARK);
    }

    // ── Concurrency ───────────────────────────────────────────────────────────

    #[test]
    fn test_concurrent_clicks_on_same_target_accept_exactly_one() {
        // Arrange
        let guard = Arc::new(DebounceGuard::default());
        let view = View::new("shared");

        // Act
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let guard = Arc::clone(&guard);
                let view = Arc::clone(&view);
                thread::spawn(move || guard.should_accept(&view, 5_000).unwrap())
            })
            .collect();
        let accepted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&a| a)
            .count();

        // Assert
        assert_eq!(accepted, 1);
    }

    #[test]
    fn test_poisoned_lock_is_reported_once_then_recovers() {
        // Arrange – poison the mutex by panicking while holding it
        let guard = Arc::new(DebounceGuard::default());
        let poisoner = Arc::clone(&guard);
        let _ = thread::spawn(move || {
            let _held = poisoner.table.lock().unwrap();
            panic!("poison the side-table");
        })
        .join();
        let view = View::new("x");

        // Act
        let first = guard.should_accept(&view, 0);
        let after: Vec<_> = [0, 100, 600]
            .iter()
            .map(|&t| guard.should_accept(&view, t))
            .collect();

        // Assert – only the call that saw the poison fails; debouncing resumes
        assert_eq!(first, Err(GuardError::StatePoisoned));
        assert_eq!(after, vec![Ok(true), Ok(false), Ok(true)]);
        assert!(!guard.table.is_poisoned());
    }
}
