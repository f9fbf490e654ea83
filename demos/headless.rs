//! Headless playback session
//!
//! Run with: cargo run --example headless
//!
//! Plays three synthetic streams of different lengths into a recording
//! sink while a scripted operator freezes, rewinds and resumes. Useful to
//! watch the player's logs without a terminal:
//!
//!   RUST_LOG=syncplay=debug cargo run --example headless

use std::time::Duration;

use syncplay::display::RecordingDisplay;
use syncplay::media::process::solid_rgb;
use syncplay::media::Frame;
use syncplay::source::MemoryOpener;
use syncplay::{Command, Player, PlayerConfig};
use tokio::sync::mpsc;

/// Synthetic stream: a colour ramp, one step per frame
fn ramp(frames: u8, channel: usize) -> Vec<Frame> {
    (0..frames)
        .map(|i| {
            let mut rgb = [0u8; 3];
            rgb[channel] = i.saturating_mul(8);
            solid_rgb(64, 48, (rgb[0], rgb[1], rgb[2]))
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("syncplay=info".parse()?)
                .add_directive("headless=info".parse()?),
        )
        .init();

    let opener = MemoryOpener::new()
        .with_stream("red", ramp(30, 0))
        .with_stream("green", ramp(20, 1))
        .with_stream("blue", ramp(12, 2));

    let config = PlayerConfig::with_streams(vec!["red".into(), "green".into(), "blue".into()])
        .fps(20.0)
        .cache_capacity(8);

    let player = Player::open(config, &opener, RecordingDisplay::new()).await?;
    let (tx, rx) = mpsc::channel(16);

    let operator = tokio::spawn(async move {
        let script = [
            (300, Command::Freeze),
            (100, Command::StepBackward),
            (100, Command::StepBackward),
            (100, Command::Progress),
            (100, Command::JumpToEarliest),
            (100, Command::Resume),
            (800, Command::Progress),
            (100, Command::Quit),
        ];
        for (delay, command) in script {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            if tx.send(command).await.is_err() {
                break;
            }
        }
    });

    let stats = player.run(rx).await?;
    operator.await?;

    println!(
        "{} ticks ({} fresh, {} replayed), {} frames shown in {:.1}s",
        stats.ticks,
        stats.fresh_ticks,
        stats.replayed_ticks,
        stats.frames_shown,
        stats.duration().as_secs_f64()
    );
    Ok(())
}
