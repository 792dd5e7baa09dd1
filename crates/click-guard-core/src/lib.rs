//! # click-guard-core
//!
//! Shared library for Click Guard containing the debounce decision logic,
//! the monotonic clock abstraction, and the identities of click targets and
//! click handlers.
//!
//! This crate is used by the dispatch layer in `click-guard`.
//! It has zero dependencies on OS APIs, UI frameworks, or async runtimes.
//!
//! # Architecture overview (for beginners)
//!
//! Click Guard sits between a UI framework's event dispatch and the click
//! handlers an application registers.  When a user hammers a button, the
//! framework delivers a burst of clicks; Click Guard lets the first one through
//! and drops the repeats that arrive within a short window (500 ms by default).
//!
//! This crate (`click-guard-core`) is the foundation.  It defines:
//!
//! - **`domain`** – The things clicks are about: the [`View`] a click lands on
//!   (compared by identity, never by value) and the [`HandlerDescriptor`] that
//!   names a click handler and says whether it opted out of debouncing.
//!
//! - **`guard`** – The [`DebounceGuard`]: a side-table from target identity to
//!   the time of the last accepted click, plus the accept/reject rule.
//!
//! - **`clock`** – The [`Clock`] trait and its implementations.  Production code
//!   reads a monotonic clock; tests drive a [`ManualClock`] by hand.

pub mod clock;
pub mod domain;
pub mod guard;

// Re-export the most-used types at the crate root so callers can write
// `click_guard_core::DebounceGuard` instead of `click_guard_core::guard::DebounceGuard`.
#[cfg(any(test, feature = "mock"))]
pub use clock::MockClock;
pub use clock::{Clock, ClockError, ManualClock, MonotonicClock};
pub use domain::handler::{HandlerDescriptor, HandlerId};
pub use domain::view::View;
pub use guard::{DebounceGuard, GuardError, SuppressionState, DEFAULT_THRESHOLD};
