//! Storage infrastructure: configuration file loading.
//!
//! The `config` sub-module reads the TOML configuration file from an explicit
//! path or the platform-appropriate directory, falls back to defaults on first
//! run, and converts the network section into the socket-level settings used
//! by discovery.

pub mod config;
