mod command;
mod config;
mod device;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use command::RunSummary;
use config::{OverflowPolicy, RunConfig};
use pwmcmd_shared::{limits, Syntax};
use std::path::PathBuf;
use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const COMMANDS_HELP: &str = "\
Commands:
  0x..      hexadecimal bytecode byte
  Wnnn      wait nnn milliseconds
  S         send constructed buffer to device
  start     start program command (0x03)
  stop      stop program command (0x02)
  Pnmm      set power of motor 'n' (A,B,C,D) to 'mm' (0-100)
  On        turn on motor 'n' (A,B,C,D)
  Fn        turn off motor 'n' (A,B,C,D) and float
  Bn        turn off motor 'n' (A,B,C,D) and brake
  Dnd       set direction of motor 'n' (A,B,C,D) to 'd' (-1,1)

Example:
  pwmcmd -d /dev/ev3dev_pwm start S PA30 S OA W500 PA50 W200 FA S stop

Note: the current driver only handles a single command at a time, so these
must be explicitly flushed (S) before the next, or implicitly before a wait (Wnnn).";

#[derive(Parser, Debug)]
#[command(
    name = "pwmcmd",
    version,
    about = "Send motor commands to the EV3 PWM device",
    after_help = COMMANDS_HELP
)]
struct Cli {
    /// Use named device
    #[arg(short, long, value_name = "DEV", default_value = limits::DEFAULT_DEVICE)]
    device: PathBuf,

    /// Be more verbose (incremental)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Bytecode buffer capacity in bytes
    #[arg(long, value_name = "BYTES", default_value_t = limits::MAX_BYTECODE_LEN, value_parser = parse_capacity)]
    capacity: usize,

    /// What to do when a command does not fit in the buffer
    #[arg(long = "on-overflow", value_enum, value_name = "POLICY", default_value_t = OverflowPolicy::Flush)]
    on_overflow: OverflowPolicy,

    /// Print each frame as hex instead of writing to the device
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Reject unrecognised commands and trailing characters instead of skipping them
    #[arg(long)]
    strict: bool,

    /// Compile the commands without opening the device or sleeping; catches
    /// invalid commands and overflow errors but not device write failures
    #[arg(long, conflicts_with = "dry_run")]
    check: bool,

    /// Commands to compile, in order
    #[arg(value_name = "CMD", trailing_var_arg = true)]
    commands: Vec<String>,
}

impl Cli {
    fn run_config(&self) -> RunConfig {
        RunConfig {
            device: self.device.clone(),
            capacity: self.capacity,
            overflow: self.on_overflow,
            syntax: if self.strict {
                Syntax::Strict
            } else {
                Syntax::Lenient
            },
            dry_run: self.dry_run,
        }
    }
}

fn parse_capacity(value: &str) -> Result<usize, String> {
    let capacity: usize = value.parse().map_err(|e| format!("{e}"))?;
    let min = pwmcmd_shared::codec::MAX_INSTRUCTION_LEN;
    if !(min..=limits::MAX_BUFFER_CAPACITY).contains(&capacity) {
        return Err(format!(
            "capacity must be {}-{} bytes",
            min,
            limits::MAX_BUFFER_CAPACITY
        ));
    }
    Ok(capacity)
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).without_time())
        .with(EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

async fn run(cli: &Cli) -> Result<RunSummary> {
    let config = cli.run_config();

    if cli.check {
        let summary = command::check(&config, &cli.commands)
            .await
            .context("invalid command")?;
        info!("Checked {} commands", summary.processed);
        return Ok(summary);
    }

    info!(
        "Buffer capacity {} bytes, overflow policy {}",
        config.capacity, config.overflow
    );

    let summary = command::execute(&config, &cli.commands).await?;
    Ok(summary)
}

/// Log the outcome of a run and pick the exit status
fn report(result: &Result<RunSummary>) -> u8 {
    match result {
        Ok(summary) => {
            info!(
                "Done: {} commands, {} skipped, {} ignored, {} writes, {} bytes",
                summary.processed,
                summary.skipped,
                summary.ignored,
                summary.flushes,
                summary.bytes_written
            );
            0
        }
        Err(e) => {
            error!("{:#}", e);
            1
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = run(&cli).await;
    ExitCode::from(report(&result))
}
