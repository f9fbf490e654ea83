//! In-memory streams
//!
//! Serves pre-decoded frames. Used for synthetic sessions and for exercising
//! the player without touching the filesystem.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;

use super::{FrameSource, StreamOpener};
use crate::error::{Error, Result};
use crate::media::Frame;

/// Stream backed by a queue of frames
#[derive(Debug)]
pub struct MemorySource {
    frames: VecDeque<Frame>,
    position: u64,
}

impl MemorySource {
    /// Create a source that yields `frames` in order, then ends
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            position: 0,
        }
    }

    /// Frames not yet read
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for MemorySource {
    async fn read_next(&mut self) -> Result<Option<Frame>> {
        let frame = self.frames.pop_front();
        if frame.is_some() {
            self.position += 1;
        }
        Ok(frame)
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn release(&mut self) {
        self.frames.clear();
    }
}

/// Opener resolving identifiers against a fixed table of frame lists
#[derive(Debug, Clone, Default)]
pub struct MemoryOpener {
    streams: HashMap<String, Arc<Vec<Frame>>>,
}

impl MemoryOpener {
    /// Create an empty opener; every identifier fails to open
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the frames served for `identifier`
    pub fn with_stream(mut self, identifier: impl Into<String>, frames: Vec<Frame>) -> Self {
        self.streams.insert(identifier.into(), Arc::new(frames));
        self
    }
}

impl StreamOpener for MemoryOpener {
    type Source = MemorySource;

    async fn open(&self, identifier: &str) -> Result<MemorySource> {
        match self.streams.get(identifier) {
            Some(frames) => Ok(MemorySource::new(frames.iter().cloned())),
            None => Err(Error::stream_open(identifier, "no such stream")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::process::solid_rgb;

    #[tokio::test]
    async fn test_memory_source_ends() {
        let mut source = MemorySource::new(vec![solid_rgb(1, 1, (0, 0, 0))]);

        assert!(source.read_next().await.unwrap().is_some());
        assert!(source.read_next().await.unwrap().is_none());
        assert!(source.read_next().await.unwrap().is_none());
        assert_eq!(source.position(), 1);
    }

    #[tokio::test]
    async fn test_memory_opener_each_open_restarts() {
        let opener = MemoryOpener::new().with_stream("a", vec![solid_rgb(1, 1, (0, 0, 0)); 2]);

        let mut first = opener.open("a").await.unwrap();
        first.read_next().await.unwrap();
        let second = opener.open("a").await.unwrap();

        assert_eq!(first.remaining(), 1);
        assert_eq!(second.remaining(), 2);
        assert!(opener.open("b").await.is_err());
    }
}
