//! Domain entities for Click Guard.
//!
//! This module contains plain data types with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! Clean Architecture organises code into concentric layers.  The innermost
//! layer is called the **domain**.  Domain code has no imports from OS APIs,
//! UI toolkits, or async runtimes, and can be tested on any platform without
//! setup.
//!
//! Click Guard's domain is small: the UI element a click lands on, and the
//! handler the click is meant for.

/// The UI element a click is dispatched against.
///
/// See [`view::View`] for the main type.
pub mod view;

/// Identity and metadata of a registered click handler.
pub mod handler;
