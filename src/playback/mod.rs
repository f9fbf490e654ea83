//! Synchronized playback control
//!
//! This module provides:
//! - Operator commands and their notices
//! - The live / frozen / melting state machine
//! - The tick driver that keeps every stream on one frame index

pub mod command;
pub mod driver;
pub mod state;

pub use command::{Command, Notice, HELP, HELP_LINE};
pub use driver::{Flow, Player};
pub use state::{PlaybackMachine, PlaybackState, Response, TickAction};
