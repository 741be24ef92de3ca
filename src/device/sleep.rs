//! Sleepers for wait tokens

use super::Sleeper;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

/// Sleeps on the tokio timer and measures the time taken
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&mut self, duration: Duration) -> Duration {
        let started = Instant::now();
        tokio::time::sleep(duration).await;
        started.elapsed()
    }
}

/// Returns at once as if the whole wait had passed. Used by `--check`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SkipSleep;

#[async_trait]
impl Sleeper for SkipSleep {
    async fn sleep(&mut self, duration: Duration) -> Duration {
        duration
    }
}
