//! Tappal CLI - command-line driver for the routing core
//!
//! Loads a YAML fixture into in-memory collaborators, runs a single
//! operation as a named officer and reports the result as JSON.

pub mod args;
pub mod commands;

pub use args::{Args, Command};
pub use commands::{run, CliError};
