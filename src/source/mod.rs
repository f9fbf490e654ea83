//! Frame sources
//!
//! A session plays a fixed set of streams. Each stream is opened once through
//! a [`StreamOpener`]; streams that fail to open are left out of the session
//! and reported at startup. The [`SourceSet`] then reads one frame from every
//! remaining stream per tick, in registration order.

pub mod memory;
pub mod set;
pub mod y4m;

use std::future::Future;

use crate::error::Result;
use crate::media::Frame;

pub use memory::{MemoryOpener, MemorySource};
pub use set::SourceSet;
pub use y4m::{Y4mFileSource, Y4mOpener};

/// A decoded stream that yields frames in order
pub trait FrameSource: Send {
    /// Read the next frame; `Ok(None)` means end of stream
    fn read_next(&mut self) -> impl Future<Output = Result<Option<Frame>>> + Send;

    /// Number of frames read so far (index of the next frame)
    fn position(&self) -> u64;

    /// Release the underlying handle; later reads report end of stream
    fn release(&mut self);
}

/// Opens streams by identifier
pub trait StreamOpener {
    /// Source type produced by this opener
    type Source: FrameSource;

    /// Open the stream named by `identifier`
    fn open(&self, identifier: &str) -> impl Future<Output = Result<Self::Source>> + Send;
}
