//! Buffered device writer
//!
//! Owns the bytecode buffer and the device sink. A flush is a single write
//! of the whole buffer; anything short of a full write is an error and the
//! buffer is left untouched.

use super::{format_frame, DeviceError, DeviceSink, Sleeper, TokioSleeper};
use pwmcmd_shared::{BufferError, BytecodeBuffer, Instruction};
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct DeviceWriter<D> {
    device: D,
    buffer: BytecodeBuffer,
    sleeper: Box<dyn Sleeper>,
    closed: bool,
    flushes: u64,
    bytes_written: u64,
}

impl<D: DeviceSink> DeviceWriter<D> {
    /// Create a writer with an empty buffer of `capacity` bytes
    pub fn new(device: D, capacity: usize) -> Self {
        Self {
            device,
            buffer: BytecodeBuffer::new(capacity),
            sleeper: Box::new(TokioSleeper),
            closed: false,
            flushes: 0,
            bytes_written: 0,
        }
    }

    /// Replace the tokio timer used by [`DeviceWriter::wait`]
    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    /// Bytes waiting for the next flush
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Check whether `len` more bytes fit without flushing
    pub fn fits(&self, len: usize) -> bool {
        self.buffer.fits(len)
    }

    pub fn push(&mut self, instruction: &Instruction) -> Result<(), BufferError> {
        self.buffer.push(instruction)
    }

    /// Successful flushes so far
    pub fn flushes(&self) -> u64 {
        self.flushes
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Write the whole buffer to the device
    ///
    /// An empty buffer is a no-op. On success the buffer is cleared; on any
    /// error or short write it is left as it was.
    pub async fn flush(&mut self) -> Result<(), DeviceError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        if self.closed {
            return Err(DeviceError::Closed(self.device.name().into()));
        }

        let requested = self.buffer.len();
        info!("Writing {} bytes", requested);
        debug!("  Frame: {}", format_frame(self.buffer.as_bytes()));

        let written = self
            .device
            .write(self.buffer.as_bytes())
            .await
            .map_err(|source| DeviceError::Write {
                device: self.device.name().into(),
                requested,
                source,
            })?;

        if written != requested {
            return Err(DeviceError::ShortWrite {
                device: self.device.name().into(),
                requested,
                written,
            });
        }

        self.buffer.clear();
        self.flushes += 1;
        self.bytes_written += requested as u64;
        Ok(())
    }

    /// Flush, then suspend for `duration`
    ///
    /// A failed flush skips the sleep. A sleep that comes back early is only
    /// worth a warning.
    pub async fn wait(&mut self, duration: Duration) -> Result<(), DeviceError> {
        self.flush().await?;

        info!("Sleeping for {} milliseconds", duration.as_millis());
        let slept = self.sleeper.sleep(duration).await;

        if slept < duration {
            warn!(
                "Short sleep: woke after {} of {} milliseconds",
                slept.as_millis(),
                duration.as_millis()
            );
        }
        Ok(())
    }

    /// Close the device. Safe to call more than once.
    pub async fn close(&mut self) -> Result<(), DeviceError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if !self.buffer.is_empty() {
            debug!("Discarding {} unflushed bytes", self.pending());
            self.buffer.clear();
        }
        self.device.close().await
    }
}
