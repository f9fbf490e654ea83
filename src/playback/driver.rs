//! Tick driver
//!
//! One control loop owns the history cache and the state machine. Each tick
//! it either reads a fresh frame set from every stream and caches it, or
//! re-shows a cached one; then it waits at most one tick period for a single
//! operator command and applies it.
//!
//! ```text
//!   ┌──────────── tick ─────────────┐
//!   │ begin_tick ─► Advance ─► read all streams ─► cache.push ─┐
//!   │           └─► Replay(o) ─► cache.get(o) ─────────────────┤
//!   │                                     show + present ◄─────┘
//!   │ end_tick
//!   └─► wait ≤ period for one Command ─► apply ─► loop
//! ```
//!
//! Streams and windows are released on every exit path.

use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::command::{Command, HELP, HELP_LINE};
use super::state::{PlaybackMachine, PlaybackState, Response, TickAction};
use crate::config::PlayerConfig;
use crate::display::{window_placement, DisplaySink};
use crate::error::{Error, Result};
use crate::media::{FrameProcessor, HistoryCache};
use crate::source::{FrameSource, SourceSet, StreamOpener};
use crate::stats::PlaybackStats;

/// Whether the loop keeps going after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Synchronized multi-stream player
pub struct Player<S: FrameSource, D: DisplaySink> {
    config: PlayerConfig,
    sources: SourceSet<S>,
    display: D,
    cache: HistoryCache,
    machine: PlaybackMachine,
    processor: FrameProcessor,
    stats: PlaybackStats,
    /// Offset shown by the last tick (`-1` after a fresh read)
    last_shown: Option<isize>,
    /// Set once every stream has ended and this was reported
    exhausted: bool,
    finished: bool,
}

impl<S: FrameSource, D: DisplaySink> Player<S, D> {
    /// Validate the config, open every stream and create the windows
    pub async fn open<O>(config: PlayerConfig, opener: &O, display: D) -> Result<Self>
    where
        O: StreamOpener<Source = S>,
    {
        let config = config.validate()?;
        let sources = SourceSet::open(opener, &config.streams).await;
        Self::new(config, sources, display)
    }

    /// Create a player over already-open streams and create the windows
    ///
    /// On failure the streams are released and the windows destroyed.
    pub fn new(config: PlayerConfig, sources: SourceSet<S>, display: D) -> Result<Self> {
        let config = config.validate()?;
        let processor = FrameProcessor::new(config.scale, config.color);
        let cache = HistoryCache::with_capacity(config.cache_capacity);

        let mut player = Self {
            config,
            sources,
            display,
            cache,
            machine: PlaybackMachine::new(),
            processor,
            stats: PlaybackStats::new(),
            last_shown: None,
            exhausted: false,
            finished: false,
        };

        let rects = window_placement(
            player.sources.len(),
            player.config.frame_width,
            player.config.frame_height,
            player.config.layout_rows,
            player.config.layout_origin,
        );
        for (label, rect) in player.sources.labels().zip(rects) {
            player.display.create_window(label, rect)?;
        }

        if let Some(report) = player.sources.failure_report() {
            player.display.status(&report.to_string())?;
        }
        if player.sources.is_empty() {
            warn!("Playing without any stream");
        }

        info!(
            streams = player.sources.len(),
            failed = player.sources.failures().len(),
            fps = player.config.fps,
            cache = player.cache.capacity(),
            "Player ready"
        );

        Ok(player)
    }

    /// Current playback state
    pub fn state(&self) -> PlaybackState {
        self.machine.state()
    }

    /// Frame history
    pub fn cache(&self) -> &HistoryCache {
        &self.cache
    }

    /// Open streams
    pub fn sources(&self) -> &SourceSet<S> {
        &self.sources
    }

    /// Display sink
    pub fn display(&self) -> &D {
        &self.display
    }

    /// Statistics so far
    pub fn stats(&self) -> &PlaybackStats {
        &self.stats
    }

    /// Offset of the frame set shown by the last tick
    pub fn last_shown(&self) -> Option<isize> {
        self.last_shown
    }

    /// Run one tick: advance or replay, then display
    pub async fn tick(&mut self) -> Result<()> {
        let offset = match self.machine.begin_tick() {
            TickAction::Advance => {
                if self.machine.state().is_frozen() {
                    self.stats.peeks += 1;
                }
                let frames = self.sources.read_all(&self.processor).await?;
                self.cache.push(frames);
                self.stats.fresh_ticks += 1;
                self.report_exhausted()?;
                -1
            }
            TickAction::Replay(offset) => {
                if let PlaybackState::Melting(o) = self.machine.state() {
                    debug!(offset = o, "Melting");
                }
                self.stats.replayed_ticks += 1;
                offset
            }
        };

        self.show(offset)?;
        self.machine.end_tick();
        self.stats.ticks += 1;
        Ok(())
    }

    /// Apply one operator command
    pub fn handle(&mut self, command: Command) -> Result<Flow> {
        self.stats.commands += 1;
        let before = self.machine.state();

        match self.machine.apply(command, self.cache.len()) {
            Response::Quit => {
                info!(state = ?before, "Quit requested");
                return Ok(Flow::Quit);
            }
            Response::Progress => {
                let line = self.sources.progress_line();
                info!(progress = %line, "Progress");
                self.display.status(&line)?;
            }
            Response::Help => {
                info!("\n{}", HELP);
                self.display.status(HELP_LINE)?;
            }
            Response::Continue(Some(notice)) => {
                self.stats.notices += 1;
                info!(?command, state = ?before, "{}", notice);
                self.display.status(&notice.to_string())?;
            }
            Response::Continue(None) => {
                let after = self.machine.state();
                if after != before {
                    debug!(?command, from = ?before, to = ?after, "State changed");
                    self.display.status(&describe(after))?;
                } else {
                    debug!(?command, state = ?before, "Command ignored");
                }
            }
        }

        Ok(Flow::Continue)
    }

    /// Play until the operator quits or the command channel closes
    ///
    /// Each tick waits at most one tick period for a command. Streams and
    /// windows are released before returning, including on error.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) -> Result<PlaybackStats> {
        let result = self.run_loop(&mut commands).await;
        self.finish();

        match &result {
            Ok(()) => info!(
                ticks = self.stats.ticks,
                fresh = self.stats.fresh_ticks,
                replayed = self.stats.replayed_ticks,
                tick_rate = self.stats.tick_rate(),
                replay_pct = self.stats.replay_ratio(),
                "Playback finished"
            ),
            Err(e) => warn!(error = %e, ticks = self.stats.ticks, "Playback aborted"),
        }
        result.map(|()| self.stats.clone())
    }

    async fn run_loop(&mut self, commands: &mut mpsc::Receiver<Command>) -> Result<()> {
        let period = self.config.tick_period();
        let mut first_tick = true;

        loop {
            self.tick().await?;

            if first_tick {
                first_tick = false;
                if self.config.freeze_on_start {
                    self.machine.freeze(self.cache.len());
                    debug!("Frozen on start");
                }
            }

            let command = match timeout(period, commands.recv()).await {
                Ok(Some(command)) => command,
                Ok(None) => {
                    info!("Command input closed");
                    return Ok(());
                }
                Err(_) => continue,
            };

            if self.handle(command)? == Flow::Quit {
                return Ok(());
            }
        }
    }

    /// Release every stream and destroy the windows; safe to call twice
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.sources.release_all();
        if let Err(e) = self.display.destroy_all_windows() {
            warn!(error = %e, "Failed to destroy windows");
        }
    }

    fn show(&mut self, offset: isize) -> Result<()> {
        let frames = self.cache.get(offset).ok_or(Error::InvalidOffset {
            offset,
            len: self.cache.len(),
        })?;

        for (label, frame) in frames.iter() {
            self.display.show(label, frame)?;
            self.stats.frames_shown += 1;
        }
        self.display.present()?;
        self.last_shown = Some(offset);
        Ok(())
    }

    fn report_exhausted(&mut self) -> Result<()> {
        if !self.exhausted && self.sources.is_exhausted() {
            self.exhausted = true;
            if !self.sources.is_empty() {
                info!(ticks = self.stats.ticks, "All streams ended");
                self.display.status("All streams ended")?;
            }
        }
        Ok(())
    }
}

impl<S: FrameSource, D: DisplaySink> Drop for Player<S, D> {
    fn drop(&mut self) {
        self.finish();
    }
}

fn describe(state: PlaybackState) -> String {
    match state {
        PlaybackState::Live => "Playing".to_string(),
        PlaybackState::Frozen(o) => format!("Frozen at {}", o),
        PlaybackState::Melting(o) => format!("Melting from {}", o),
    }
}
