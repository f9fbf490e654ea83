//! Command-line interface

use std::io::{self, BufRead, IsTerminal};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::PlayerConfig;
use crate::error::{Error, Result};
use crate::media::ColorMode;

/// Placeholder identifier meaning "read identifiers from stdin"
pub const STDIN_PLACEHOLDER: &str = "-";

#[derive(Debug, Parser)]
#[command(
    name = "syncplay",
    about = "Play several videos in lockstep with freeze, step and rewind",
    version
)]
pub struct Cli {
    /// Videos to play (YUV4MPEG2). A single `-` reads paths from stdin.
    #[arg(value_name = "VIDEO", required = true)]
    pub videos: Vec<String>,

    /// Playback frame rate
    #[arg(long, default_value_t = 6.0)]
    pub fps: f64,

    /// Colour mode: `r` for colour, `g` for grayscale
    #[arg(short = 'c', long = "color", value_enum, default_value_t = ColorArg::R)]
    pub color: ColorArg,

    /// Downsample factor applied to every frame
    #[arg(short = 's', long, default_value_t = 1.0)]
    pub scale: f64,

    /// Window size used for the grid layout
    #[arg(
        long = "frame-size",
        visible_alias = "hw",
        num_args = 2,
        value_names = ["HEIGHT", "WIDTH"],
        default_values_t = [480u32, 704u32]
    )]
    pub frame_size: Vec<u32>,

    /// Freeze right after the first frame is shown
    #[arg(short = 'b', long = "freeze-once-start")]
    pub freeze_on_start: bool,

    /// Number of frame sets kept for rewinding
    #[arg(short = 'n', long = "cache-size", default_value_t = 10)]
    pub cache_size: usize,

    /// Rows in the window grid
    #[arg(long, default_value_t = 2)]
    pub rows: usize,

    /// Write logs to this file instead of stderr
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorArg {
    /// Colour
    R,
    /// Grayscale
    G,
}

impl From<ColorArg> for ColorMode {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::R => ColorMode::Color,
            ColorArg::G => ColorMode::Grayscale,
        }
    }
}

impl Cli {
    /// Whether the identifiers should be read from stdin
    pub fn wants_stdin(&self) -> bool {
        self.videos.len() == 1 && self.videos[0] == STDIN_PLACEHOLDER
    }

    /// Build the player config, reading identifiers from stdin when asked
    pub fn into_config(self) -> Result<PlayerConfig> {
        let streams = if self.wants_stdin() {
            let stdin = io::stdin();
            if stdin.is_terminal() {
                return Err(Error::Config(
                    "`-` reads video paths from stdin, but stdin is a terminal".into(),
                ));
            }
            read_identifiers(stdin.lock())?
        } else {
            self.videos.clone()
        };
        self.build_config(streams)
    }

    fn build_config(&self, streams: Vec<String>) -> Result<PlayerConfig> {
        let &[height, width] = self.frame_size.as_slice() else {
            return Err(Error::Config("frame size needs HEIGHT and WIDTH".into()));
        };

        Ok(PlayerConfig::with_streams(streams)
            .fps(self.fps)
            .scale(self.scale)
            .color(self.color.into())
            .frame_size(height, width)
            .cache_capacity(self.cache_size)
            .freeze_on_start(self.freeze_on_start)
            .layout_rows(self.rows))
    }
}

/// Read newline-delimited identifiers, trimmed, skipping blank lines
pub fn read_identifiers(reader: impl BufRead) -> Result<Vec<String>> {
    let mut identifiers = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let id = line.trim();
        if !id.is_empty() {
            identifiers.push(id.to_string());
        }
    }
    Ok(identifiers)
}
