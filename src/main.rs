//! syncplay binary
//!
//! Run with: syncplay [OPTIONS] VIDEO...
//!
//! Examples:
//!   syncplay left.y4m right.y4m                  # two windows side by side
//!   syncplay --fps 25 -c g -n 50 a.y4m b.y4m c.y4m
//!   ls cams/*.y4m | syncplay -                   # paths from stdin
//!
//! Keys: b freeze, c resume, n/p step, r/l jump to latest/earliest,
//! g progress, h help, q quit.

use std::fs::File;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

use syncplay::cli::Cli;
use syncplay::display::{screen_owned, spawn_key_reader, TerminalDisplay};
use syncplay::source::Y4mOpener;
use syncplay::{PlaybackStats, Player, Result};

/// Commands buffered between key reader and player
const COMMAND_QUEUE: usize = 16;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.log_file.as_deref()) {
        eprintln!("syncplay: cannot set up logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(stats) => {
            tracing::info!(
                ticks = stats.ticks,
                fresh = stats.fresh_ticks,
                replayed = stats.replayed_ticks,
                frames = stats.frames_shown,
                replay_pct = stats.replay_ratio(),
                secs = stats.duration().as_secs(),
                "Session summary"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Session failed");
            eprintln!("syncplay: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<PlaybackStats> {
    let config = cli.into_config()?.validate()?;

    let display = TerminalDisplay::enter()?;
    let (tx, rx) = mpsc::channel(COMMAND_QUEUE);
    let keys = spawn_key_reader(tx);

    let result = match Player::open(config, &Y4mOpener, display).await {
        Ok(player) => player.run(rx).await,
        Err(e) => Err(e),
    };

    keys.shutdown().await;
    result
}

/// Log to `path` when given, to stderr otherwise
///
/// Stderr shares the terminal with the display, so stderr logging is muted
/// while the display owns the screen; use `--log-file` to keep those events.
/// `RUST_LOG` overrides the default level.
fn init_logging(path: Option<&Path>) -> std::io::Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(env_filter("syncplay=debug"))
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter("syncplay=warn"))
                .with_writer(std::io::stderr.with_filter(|_| !screen_owned()))
                .init();
        }
    }
    Ok(())
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}
