//! Device output for compiled bytecode
//!
//! This module handles:
//! - The device sink abstraction (character device or dry run)
//! - All-or-nothing flushes of the bytecode buffer
//! - Flush-then-sleep waits between commands

mod chardev;
mod dry_run;
#[cfg(test)]
pub mod recording;
mod sleep;
mod traits;
mod writer;

pub use chardev::CharDevice;
pub use dry_run::DryRunDevice;
pub use sleep::{SkipSleep, TokioSleeper};
pub use traits::{DeviceSink, Sleeper};
pub use writer::DeviceWriter;

use std::io;
use thiserror::Error;

/// Errors raised while talking to the device
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("error writing {requested} bytes to {device}: {source}")]
    Write {
        device: String,
        requested: usize,
        #[source]
        source: io::Error,
    },

    #[error("tried to write {requested} bytes to {device}, but got back {written}")]
    ShortWrite {
        device: String,
        requested: usize,
        written: usize,
    },

    #[error("failed to close {device}: {source}")]
    Close {
        device: String,
        #[source]
        source: io::Error,
    },

    #[error("device {0} is already closed")]
    Closed(String),
}

/// Render a frame as space-separated hex bytes
pub fn format_frame(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}
