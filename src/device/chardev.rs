//! Character device sink (e.g. "/dev/ev3dev_pwm")

use super::{DeviceError, DeviceSink};
use async_trait::async_trait;
use bytes::Bytes;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Write-only handle on the device node
pub struct CharDevice {
    name: String,
    file: Option<Arc<File>>,
}

impl CharDevice {
    /// Open the device write-only. Never creates or truncates the node.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, DeviceError> {
        let path = path.as_ref();
        let name = path.display().to_string();

        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .open(path)
            .await
            .map_err(|source| DeviceError::Open {
                path: name.clone(),
                source,
            })?
            .into_std()
            .await;

        debug!("Opened {}", name);

        Ok(Self {
            name,
            file: Some(Arc::new(file)),
        })
    }
}

#[async_trait]
impl DeviceSink for CharDevice {
    async fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        let file = self
            .file
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "device closed"))?;
        let frame = Bytes::copy_from_slice(bytes);

        // One write(2) per frame; the driver takes a whole command at a time
        tokio::task::spawn_blocking(move || {
            let mut handle: &File = &file;
            handle.write(&frame)
        })
        .await
        .map_err(io::Error::other)?
    }

    async fn close(&mut self) -> Result<(), DeviceError> {
        if self.file.take().is_some() {
            debug!("Closed {}", self.name);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[tokio::test]
    async fn test_open_missing_device() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("ev3dev_pwm");

        let result = CharDevice::open(&missing).await;
        assert!(matches!(result, Err(DeviceError::Open { .. })));
        // Opening must not create the node
        assert!(!missing.exists());
    }

    #[tokio::test]
    async fn test_write_and_close() {
        let mut target = tempfile::NamedTempFile::new().unwrap();

        let mut device = CharDevice::open(target.path()).await.unwrap();
        assert_eq!(device.name(), target.path().display().to_string());

        assert_eq!(device.write(&[0x03, 0xA6, 0x01]).await.unwrap(), 3);
        assert_eq!(device.write(&[0x02]).await.unwrap(), 1);

        device.close().await.unwrap();

        let mut written = Vec::new();
        target.read_to_end(&mut written).unwrap();
        assert_eq!(written, vec![0x03, 0xA6, 0x01, 0x02]);
    }

    #[tokio::test]
    async fn test_write_after_close() {
        let target = tempfile::NamedTempFile::new().unwrap();
        let mut device = CharDevice::open(target.path()).await.unwrap();
        device.close().await.unwrap();
        // Second close is a no-op
        device.close().await.unwrap();

        let err = device.write(&[0x03]).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
    }
}
