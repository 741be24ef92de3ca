//! pwmcmd Shared Protocol Types
//!
//! This crate provides the command tokens, bytecode encoding and the bounded
//! bytecode buffer used to drive the EV3 PWM device.

pub mod buffer;
pub mod codec;
pub mod token;

// Re-export commonly used types at crate root
pub use buffer::{BufferError, BytecodeBuffer};
pub use codec::{Direction, Instruction, Motor, StopMode};
pub use token::{Classified, Syntax, Token, TokenError};

/// Protocol and command-line limits
pub mod limits {
    /// Device node created by the ev3dev PWM driver
    pub const DEFAULT_DEVICE: &str = "/dev/ev3dev_pwm";

    /// Default bytecode buffer capacity in bytes
    pub const MAX_BYTECODE_LEN: usize = 16;

    /// Largest buffer capacity accepted on the command line
    pub const MAX_BUFFER_CAPACITY: usize = 4096;

    /// Highest motor power percentage
    pub const MAX_POWER: u8 = 100;

    /// Longest single wait in milliseconds
    pub const MAX_WAIT_MS: u32 = 1_000_000;
}
