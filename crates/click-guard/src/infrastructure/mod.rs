//! Infrastructure layer for Click Guard.
//!
//! Contains host-facing adapters: click event sources and file-system storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `click_guard_core`, but MUST NOT be imported by the `application` or domain
//! layers.

pub mod click_source;
pub mod storage;
