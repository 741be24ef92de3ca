//! In-memory sink used by tests

use super::{DeviceError, DeviceSink};
use async_trait::async_trait;
use std::io;
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

/// A frame as the device saw it
#[derive(Debug, Clone)]
pub struct Frame {
    pub bytes: Vec<u8>,
    pub at: Instant,
}

#[derive(Debug, Default)]
struct Log {
    frames: Vec<Frame>,
    attempts: usize,
    closes: usize,
}

#[derive(Debug, Clone, Copy, Default)]
enum Behaviour {
    #[default]
    AcceptAll,
    AcceptAtMost(usize),
    Fail,
}

/// Records every write; clones share the same log
#[derive(Debug, Clone, Default)]
pub struct RecordingDevice {
    log: Arc<Mutex<Log>>,
    behaviour: Behaviour,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept no more than `limit` bytes per write
    pub fn short_writes(limit: usize) -> Self {
        Self {
            behaviour: Behaviour::AcceptAtMost(limit),
            ..Self::default()
        }
    }

    /// Fail every write with an I/O error
    pub fn failing() -> Self {
        Self {
            behaviour: Behaviour::Fail,
            ..Self::default()
        }
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.log.lock().unwrap().frames.clone()
    }

    /// Accepted bytes of every write, in order
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.frames().into_iter().map(|f| f.bytes).collect()
    }

    /// Number of write calls, including failed ones
    pub fn attempts(&self) -> usize {
        self.log.lock().unwrap().attempts
    }

    pub fn closes(&self) -> usize {
        self.log.lock().unwrap().closes
    }
}

#[async_trait]
impl DeviceSink for RecordingDevice {
    async fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        let mut log = self.log.lock().unwrap();
        log.attempts += 1;

        let accepted = match self.behaviour {
            Behaviour::AcceptAll => bytes.len(),
            Behaviour::AcceptAtMost(limit) => bytes.len().min(limit),
            Behaviour::Fail => {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"));
            }
        };

        log.frames.push(Frame {
            bytes: bytes[..accepted].to_vec(),
            at: Instant::now(),
        });
        Ok(accepted)
    }

    async fn close(&mut self) -> Result<(), DeviceError> {
        self.log.lock().unwrap().closes += 1;
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}
