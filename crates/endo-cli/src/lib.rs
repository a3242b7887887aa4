//! Library side of the `endo` command-line tool.
//!
//! Logging setup, persisted settings and the command implementations live
//! here so integration tests can drive them without spawning the binary.

pub mod commands;
pub mod logging;
pub mod settings;
