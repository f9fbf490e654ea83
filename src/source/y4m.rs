//! Y4M file streams

use std::path::Path;

use tokio::fs::File;
use tokio::io::BufReader;

use super::{FrameSource, StreamOpener};
use crate::error::{Error, Result};
use crate::media::y4m::{Y4mError, Y4mReader};
use crate::media::Frame;

/// Read buffer for file streams; one 4:2:0 VGA frame is ~450KB
const READ_BUFFER_SIZE: usize = 256 * 1024;

/// Opens Y4M files by path
#[derive(Debug, Clone, Copy, Default)]
pub struct Y4mOpener;

impl StreamOpener for Y4mOpener {
    type Source = Y4mFileSource;

    async fn open(&self, identifier: &str) -> Result<Y4mFileSource> {
        Y4mFileSource::open(identifier).await
    }
}

/// A Y4M file being played
#[derive(Debug)]
pub struct Y4mFileSource {
    name: String,
    /// `None` once released
    reader: Option<Y4mReader<BufReader<File>>>,
    /// Frames read before release
    position: u64,
}

impl Y4mFileSource {
    /// Open a file and parse its header
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path.display().to_string();

        let file = File::open(path)
            .await
            .map_err(|e| Error::stream_open(&name, e))?;
        let reader = Y4mReader::open(BufReader::with_capacity(READ_BUFFER_SIZE, file))
            .await
            .map_err(|e| Error::stream_open(&name, e))?;

        tracing::debug!(
            stream = %name,
            width = reader.header().width,
            height = reader.header().height,
            fps = ?reader.header().fps(),
            colorspace = ?reader.header().colorspace,
            "Y4M stream opened"
        );

        Ok(Self {
            name,
            reader: Some(reader),
            position: 0,
        })
    }
}

impl FrameSource for Y4mFileSource {
    async fn read_next(&mut self) -> Result<Option<Frame>> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };

        match reader.next_frame().await {
            Ok(frame) => {
                self.position = reader.frames_read();
                Ok(frame)
            }
            Err(Y4mError::Truncated) => {
                tracing::warn!(
                    stream = %self.name,
                    frames = self.position,
                    "Last frame truncated, ending stream"
                );
                self.reader = None;
                Ok(None)
            }
            Err(e) => Err(Error::decode(&self.name, e)),
        }
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn release(&mut self) {
        self.reader = None;
    }
}
