//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads the TOML configuration from the
//! platform-appropriate directory, writes it back on `save`, and falls back to
//! defaults when no file exists yet (first run).

pub mod config;
