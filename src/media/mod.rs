//! Frame handling for the player
//!
//! This module provides:
//! - Decoded frame and synchronized frame-set types
//! - The bounded frame history used for rewinding
//! - Grayscale conversion and downscaling
//! - YUV4MPEG2 parsing

pub mod frame;
pub mod history;
pub mod process;
pub mod y4m;

pub use frame::{Frame, FrameSet, PixelFormat, StreamLabel};
pub use history::HistoryCache;
pub use process::{ColorMode, FrameProcessor};
pub use y4m::{Colorspace, Y4mError, Y4mHeader, Y4mReader};
