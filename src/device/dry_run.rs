//! Dry-run sink: prints each frame instead of writing to hardware

use super::{format_frame, DeviceError, DeviceSink};
use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt, Stdout};

/// Accepts every frame and renders it as a line of hex
pub struct DryRunDevice<W> {
    out: W,
    frames: u64,
}

impl DryRunDevice<Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W: AsyncWrite + Unpin + Send> DryRunDevice<W> {
    pub fn new(out: W) -> Self {
        Self { out, frames: 0 }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> DeviceSink for DryRunDevice<W> {
    async fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.frames += 1;
        let line = format!("frame {}: {}\n", self.frames, format_frame(bytes));
        self.out.write_all(line.as_bytes()).await?;
        Ok(bytes.len())
    }

    async fn close(&mut self) -> Result<(), DeviceError> {
        self.out.flush().await.map_err(|source| DeviceError::Close {
            device: self.name().into(),
            source,
        })
    }

    fn name(&self) -> &str {
        "dry-run"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frames_are_numbered() {
        let mut device = DryRunDevice::new(Vec::new());

        assert_eq!(device.write(&[0x03, 0xA4, 0x01, 0x1E]).await.unwrap(), 4);
        assert_eq!(device.write(&[0x02]).await.unwrap(), 1);
        device.close().await.unwrap();

        let output = String::from_utf8(device.into_inner()).unwrap();
        assert_eq!(output, "frame 1: 03 A4 01 1E\nframe 2: 02\n");
    }
}
