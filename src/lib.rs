//! syncplay: synchronized multi-stream video playback
//!
//! Plays several video streams in lockstep, one frame per stream per tick,
//! and lets the operator freeze, step and rewind all of them together
//! through a bounded history of recent frame sets.
//!
//! # Example
//!
//! ```no_run
//! use syncplay::display::{spawn_key_reader, TerminalDisplay};
//! use syncplay::source::Y4mOpener;
//! use syncplay::{Player, PlayerConfig};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PlayerConfig::with_streams(vec!["left.y4m".into(), "right.y4m".into()])
//!         .fps(12.0)
//!         .cache_capacity(30);
//!
//!     let display = TerminalDisplay::enter()?;
//!     let (tx, rx) = mpsc::channel(16);
//!     let keys = spawn_key_reader(tx);
//!     let player = Player::open(config, &Y4mOpener, display).await?;
//!     let stats = player.run(rx).await;
//!     keys.shutdown().await;
//!
//!     println!("{} ticks", stats?.ticks);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod media;
pub mod playback;
pub mod source;
pub mod stats;

pub use config::PlayerConfig;
pub use error::{Error, Result};
pub use media::{Frame, FrameSet, HistoryCache, StreamLabel};
pub use playback::{Command, Flow, Notice, PlaybackState, Player};
pub use stats::PlaybackStats;
