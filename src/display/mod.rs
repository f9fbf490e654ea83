//! Display sinks
//!
//! A sink owns one window per stream. The player creates the windows once at
//! startup, shows every frame of each tick's frame set, and destroys all
//! windows on exit, whatever the exit path.

pub mod layout;
pub mod terminal;

use crate::error::Result;
use crate::media::{Frame, StreamLabel};

pub use layout::{window_placement, Point, WindowRect};
pub use terminal::{screen_owned, spawn_key_reader, KeyReader, TerminalDisplay};

/// Destination for decoded frames
pub trait DisplaySink {
    /// Create the window for a stream at the given position
    fn create_window(&mut self, label: &StreamLabel, rect: WindowRect) -> Result<()>;

    /// Show a frame in a stream's window
    fn show(&mut self, label: &StreamLabel, frame: &Frame) -> Result<()>;

    /// Flush everything shown during this tick
    fn present(&mut self) -> Result<()> {
        Ok(())
    }

    /// Show a one-line message to the operator
    fn status(&mut self, line: &str) -> Result<()>;

    /// Close every window; safe to call more than once
    fn destroy_all_windows(&mut self) -> Result<()>;
}

/// A sink that records what it was asked to show
///
/// Every shown frame is kept, grouped per `present` call. Useful for
/// headless runs.
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    /// Windows in creation order
    pub windows: Vec<(StreamLabel, WindowRect)>,
    /// Frames shown since the last `present`, in call order
    pub pending: Vec<(StreamLabel, Frame)>,
    /// One entry per `present` call
    pub presented: Vec<Vec<(StreamLabel, Frame)>>,
    /// Status lines, in order
    pub status_lines: Vec<String>,
    /// Whether the windows were destroyed
    pub destroyed: bool,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DisplaySink for RecordingDisplay {
    fn create_window(&mut self, label: &StreamLabel, rect: WindowRect) -> Result<()> {
        self.windows.push((label.clone(), rect));
        Ok(())
    }

    fn show(&mut self, label: &StreamLabel, frame: &Frame) -> Result<()> {
        self.pending.push((label.clone(), frame.clone()));
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        self.presented.push(std::mem::take(&mut self.pending));
        Ok(())
    }

    fn status(&mut self, line: &str) -> Result<()> {
        self.status_lines.push(line.to_string());
        Ok(())
    }

    fn destroy_all_windows(&mut self) -> Result<()> {
        self.windows.clear();
        self.destroyed = true;
        Ok(())
    }
}
