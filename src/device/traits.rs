//! Device sink abstraction for pluggable output targets

use super::DeviceError;
use async_trait::async_trait;
use std::io;
use std::time::Duration;

/// A write-only byte sink standing in for the PWM controller
#[async_trait]
pub trait DeviceSink: Send {
    /// Perform exactly one write operation, returning the bytes accepted
    async fn write(&mut self, bytes: &[u8]) -> io::Result<usize>;

    /// Release the underlying handle
    async fn close(&mut self) -> Result<(), DeviceError>;

    /// Human-readable name for log lines and errors
    fn name(&self) -> &str;
}

/// Suspends the command stream for a wait token
#[async_trait]
pub trait Sleeper: Send {
    /// Sleep for about `duration` and report how long it actually took
    async fn sleep(&mut self, duration: Duration) -> Duration;
}
