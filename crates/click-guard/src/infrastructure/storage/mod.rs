//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads the TOML configuration file from the
//! platform-appropriate directory, writes it back, and supplies defaults when
//! the file does not exist yet (first run).
//!
//! Suppression state is never stored here; it lives only in memory for the
//! lifetime of the process.

pub mod config;
