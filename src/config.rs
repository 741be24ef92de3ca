//! Run configuration, built from the command line

use pwmcmd_shared::{limits, Syntax};
use std::fmt;
use std::path::PathBuf;

/// What to do when the next instruction does not fit in the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OverflowPolicy {
    /// Flush what is buffered, then carry on
    #[default]
    Flush,
    /// Stop consuming commands (with a warning) and flush what is buffered
    Stop,
    /// Abort the run
    Error,
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowPolicy::Flush => write!(f, "flush"),
            OverflowPolicy::Stop => write!(f, "stop"),
            OverflowPolicy::Error => write!(f, "error"),
        }
    }
}

/// Configuration for a single run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Device node to write to
    pub device: PathBuf,
    /// Bytecode buffer capacity in bytes
    pub capacity: usize,
    /// Behaviour when the buffer would overflow
    pub overflow: OverflowPolicy,
    /// How closely tokens must match the command grammar
    pub syntax: Syntax,
    /// Print frames instead of opening the device
    pub dry_run: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            device: PathBuf::from(limits::DEFAULT_DEVICE),
            capacity: limits::MAX_BYTECODE_LEN,
            overflow: OverflowPolicy::default(),
            syntax: Syntax::default(),
            dry_run: false,
        }
    }
}
