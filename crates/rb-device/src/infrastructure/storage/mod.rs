//! Storage infrastructure: device configuration file persistence.
//!
//! The `config` sub-module handles:
//!
//! - Reading `device.toml` from an explicit path or the platform config
//!   directory.
//! - Generating and persisting a stable device id on first run.
//! - Providing defaults for every field that is absent from the file.

pub mod config;
