//! Command runner - compiles tokens into the buffer and drives flushes

use crate::config::{OverflowPolicy, RunConfig};
use crate::device::{
    CharDevice, DeviceError, DeviceSink, DeviceWriter, DryRunDevice, Sleeper, SkipSleep,
};
use pwmcmd_shared::{BufferError, Classified, Syntax, Token, TokenError};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

/// Errors that abort the command stream
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error("no room for [{token}]: {source}")]
    Overflow {
        token: String,
        #[source]
        source: BufferError,
    },
}

/// What a run got through
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Tokens compiled and acted on
    pub processed: usize,
    /// Tokens left unprocessed by the `stop` overflow policy
    pub skipped: usize,
    /// Unrecognised tokens passed over under lenient syntax
    pub ignored: usize,
    /// Successful device writes
    pub flushes: u64,
    /// Total bytes written to the device
    pub bytes_written: u64,
}

/// Compiles tokens left to right into a device writer
pub struct CommandRunner<D> {
    writer: DeviceWriter<D>,
    overflow: OverflowPolicy,
    syntax: Syntax,
}

impl<D: DeviceSink> CommandRunner<D> {
    /// Create a runner owning `device`
    pub fn new(device: D, config: &RunConfig) -> Self {
        Self {
            writer: DeviceWriter::new(device, config.capacity),
            overflow: config.overflow,
            syntax: config.syntax,
        }
    }

    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.writer = self.writer.with_sleeper(sleeper);
        self
    }

    /// Process every token, then flush whatever is left
    ///
    /// The first invalid token aborts the run; bytes not yet flushed are
    /// dropped. Under lenient syntax unrecognised tokens and trailing text
    /// are skipped with a warning instead. The device stays open either
    /// way, see [`CommandRunner::close`].
    pub async fn run<S: AsRef<str>>(&mut self, tokens: &[S]) -> Result<RunSummary, RunError> {
        let mut summary = RunSummary::default();

        for (index, raw) in tokens.iter().enumerate() {
            let raw = raw.as_ref();
            let token = match Token::classify(raw, self.syntax) {
                Ok(Classified::Exact(token)) => token,
                Ok(Classified::Prefix { token, ignored }) => {
                    warn!("Ignoring trailing [{}] in [{}]", ignored, raw);
                    token
                }
                Ok(Classified::Unknown) => {
                    warn!("Ignoring unrecognised command [{}]", raw);
                    summary.ignored += 1;
                    continue;
                }
                Err(e) => {
                    debug!(
                        "Stopping at [{}], {} commands not processed",
                        e.token(),
                        tokens.len() - index
                    );
                    return Err(e.into());
                }
            };
            trace!("[{}] -> {:?}", raw, token);

            match token {
                Token::Send => self.writer.flush().await?,
                Token::Wait(duration) => self.writer.wait(duration).await?,
                Token::Instruction(instruction) => {
                    if !self.writer.fits(instruction.encoded_len()) {
                        match self.overflow {
                            OverflowPolicy::Flush => {
                                debug!("Buffer full before [{}], flushing", raw);
                                self.writer.flush().await?;
                            }
                            OverflowPolicy::Stop => {
                                summary.skipped = tokens.len() - index;
                                warn!(
                                    "Bytecode buffer full ({} bytes) at [{}]: {} remaining commands not processed",
                                    self.writer.capacity(),
                                    raw,
                                    summary.skipped
                                );
                                break;
                            }
                            // push below reports the overflow
                            OverflowPolicy::Error => {}
                        }
                    }

                    self.writer
                        .push(&instruction)
                        .map_err(|source| RunError::Overflow {
                            token: raw.into(),
                            source,
                        })?;
                }
            }

            summary.processed += 1;
        }

        // If we have any left, send them
        self.writer.flush().await?;

        summary.flushes = self.writer.flushes();
        summary.bytes_written = self.writer.bytes_written();
        Ok(summary)
    }

    /// Release the device, discarding anything unflushed
    pub async fn close(&mut self) -> Result<(), DeviceError> {
        self.writer.close().await
    }
}

/// Run `tokens` against an already-open device and always close it
pub async fn run_on<D, S>(device: D, config: &RunConfig, tokens: &[S]) -> Result<RunSummary, RunError>
where
    D: DeviceSink,
    S: AsRef<str>,
{
    finish(CommandRunner::new(device, config), tokens).await
}

/// Compile `tokens` against a sink that discards every frame, skipping waits
///
/// Reports everything a real run would except device errors.
pub async fn check<S: AsRef<str>>(config: &RunConfig, tokens: &[S]) -> Result<RunSummary, RunError> {
    let runner =
        CommandRunner::new(DryRunDevice::new(tokio::io::sink()), config).with_sleeper(SkipSleep);
    finish(runner, tokens).await
}

async fn finish<D, S>(mut runner: CommandRunner<D>, tokens: &[S]) -> Result<RunSummary, RunError>
where
    D: DeviceSink,
    S: AsRef<str>,
{
    let result = runner.run(tokens).await;
    let closed = runner.close().await;

    match (result, closed) {
        (Ok(summary), Ok(())) => Ok(summary),
        (Ok(_), Err(e)) => Err(e.into()),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_err)) => {
            warn!("{}", close_err);
            Err(e)
        }
    }
}

/// Open the configured device and run `tokens` against it
///
/// No tokens is a successful no-op and the device is never opened.
pub async fn execute<S: AsRef<str>>(config: &RunConfig, tokens: &[S]) -> Result<RunSummary, RunError> {
    if tokens.is_empty() {
        warn!("No commands given");
        return Ok(RunSummary::default());
    }

    if config.dry_run {
        info!("Dry run, not opening [{}]", config.device.display());
        return run_on(DryRunDevice::stdout(), config, tokens).await;
    }

    info!("Using device [{}]", config.device.display());
    let device = CharDevice::open(&config.device).await?;
    run_on(device, config, tokens).await
}
