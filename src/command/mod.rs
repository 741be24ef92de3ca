//! Command compilation and execution against the device
//!
//! This module handles:
//! - Classifying command tokens and appending their bytecode
//! - Skipping unrecognised tokens unless the syntax is strict
//! - Flushing on `S`, on `W`, on overflow and at end of input
//! - Closing the device on every exit path

mod runner;

pub use runner::{check, execute, RunSummary};
