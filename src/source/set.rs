//! Ordered set of open streams

use tracing::{debug, info, warn};

use super::{FrameSource, StreamOpener};
use crate::error::{Error, Result};
use crate::media::{FrameProcessor, FrameSet, StreamLabel};

/// One open stream
#[derive(Debug)]
struct ActiveStream<S> {
    label: StreamLabel,
    source: S,
    /// Set once the stream reported end of stream
    ended: bool,
}

/// Streams playing in one session, in registration order
#[derive(Debug)]
pub struct SourceSet<S> {
    streams: Vec<ActiveStream<S>>,
    /// Streams that could not be opened, with the reason
    failures: Vec<(StreamLabel, String)>,
    released: bool,
}

impl<S: FrameSource> SourceSet<S> {
    /// Open every identifier, dropping those that fail
    ///
    /// Failures are logged once here and never retried. A set where every
    /// stream failed is still returned; it simply yields empty frame sets.
    pub async fn open<O>(opener: &O, identifiers: &[String]) -> Self
    where
        O: StreamOpener<Source = S>,
    {
        let mut streams = Vec::with_capacity(identifiers.len());
        let mut failures = Vec::new();

        for id in identifiers {
            let label = StreamLabel::new(id);
            match opener.open(id).await {
                Ok(source) => {
                    debug!(stream = %label, "Stream opened");
                    streams.push(ActiveStream {
                        label,
                        source,
                        ended: false,
                    });
                }
                Err(e) => {
                    warn!(stream = %label, error = %e, "Failed to open stream, skipping");
                    failures.push((label, e.to_string()));
                }
            }
        }

        if streams.is_empty() && !identifiers.is_empty() {
            warn!(requested = identifiers.len(), "No stream could be opened");
        }

        Self {
            streams,
            failures,
            released: false,
        }
    }

    /// Build a set from already-open sources
    pub fn from_sources(sources: impl IntoIterator<Item = (StreamLabel, S)>) -> Self {
        Self {
            streams: sources
                .into_iter()
                .map(|(label, source)| ActiveStream {
                    label,
                    source,
                    ended: false,
                })
                .collect(),
            failures: Vec::new(),
            released: false,
        }
    }

    /// Read one frame from every stream that has not ended
    ///
    /// Streams are read in registration order. A stream reaching end of
    /// stream contributes no entry now or on any later tick.
    pub async fn read_all(&mut self, processor: &FrameProcessor) -> Result<FrameSet> {
        let mut entries = Vec::with_capacity(self.streams.len());

        for stream in self.streams.iter_mut().filter(|s| !s.ended) {
            match stream.source.read_next().await? {
                Some(frame) => {
                    let frame = if processor.is_identity() {
                        frame
                    } else {
                        processor.apply(frame)
                    };
                    entries.push((stream.label.clone(), frame));
                }
                None => {
                    stream.ended = true;
                    info!(
                        stream = %stream.label,
                        frames = stream.source.position(),
                        "Stream ended"
                    );
                }
            }
        }

        Ok(FrameSet::new(entries))
    }

    /// Labels of the open streams, in registration order
    pub fn labels(&self) -> impl Iterator<Item = &StreamLabel> {
        self.streams.iter().map(|s| &s.label)
    }

    /// Number of open streams (ended or not)
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// Whether no stream could be opened
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Number of streams still producing frames
    pub fn active_count(&self) -> usize {
        self.streams.iter().filter(|s| !s.ended).count()
    }

    /// Whether every stream has ended
    pub fn is_exhausted(&self) -> bool {
        self.active_count() == 0
    }

    /// Current frame index of every stream, in registration order
    pub fn positions(&self) -> Vec<u64> {
        self.streams.iter().map(|s| s.source.position()).collect()
    }

    /// Frame indices joined with `|`, as shown by the progress command
    pub fn progress_line(&self) -> String {
        self.positions()
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join("|")
    }

    /// Streams that failed to open
    pub fn failures(&self) -> &[(StreamLabel, String)] {
        &self.failures
    }

    /// Error describing every open failure, if any
    pub fn failure_report(&self) -> Option<Error> {
        if self.failures.is_empty() {
            return None;
        }
        let streams = self
            .failures
            .iter()
            .map(|(label, _)| label.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let reason = self
            .failures
            .iter()
            .map(|(_, reason)| reason.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        Some(Error::StreamOpen { stream: streams, reason })
    }

    /// Release every stream handle; safe to call more than once
    pub fn release_all(&mut self) {
        if self.released {
            return;
        }
        for stream in &mut self.streams {
            stream.source.release();
            stream.ended = true;
        }
        self.released = true;
        debug!(streams = self.streams.len(), "Streams released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::process::solid_rgb;
    use crate::media::ColorMode;
    use crate::source::memory::MemoryOpener;

    fn identity() -> FrameProcessor {
        FrameProcessor::new(1.0, ColorMode::Color)
    }

    fn opener() -> MemoryOpener {
        MemoryOpener::new()
            .with_stream("a", vec![solid_rgb(2, 2, (1, 1, 1)); 3])
            .with_stream("b", vec![solid_rgb(2, 2, (2, 2, 2)); 1])
    }

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_open_skips_failures() {
        let set = SourceSet::open(&opener(), &ids(&["a", "missing", "b"])).await;

        assert_eq!(set.len(), 2);
        let labels: Vec<_> = set.labels().map(|l| l.as_str()).collect();
        assert_eq!(labels, ["a", "b"]);
        assert_eq!(set.failures().len(), 1);
        assert_eq!(set.failures()[0].0.as_str(), "missing");
        assert!(matches!(
            set.failure_report(),
            Some(Error::StreamOpen { ref stream, .. }) if stream == "missing"
        ));
    }

    #[tokio::test]
    async fn test_all_streams_fail() {
        let mut set = SourceSet::open(&opener(), &ids(&["x", "y"])).await;

        assert!(set.is_empty());
        assert!(set.is_exhausted());
        let frames = set.read_all(&identity()).await.unwrap();
        assert!(frames.is_empty());
    }

    #[tokio::test]
    async fn test_ended_stream_drops_out() {
        let mut set = SourceSet::open(&opener(), &ids(&["a", "b"])).await;

        let first = set.read_all(&identity()).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(set.progress_line(), "1|1");

        let second = set.read_all(&identity()).await.unwrap();
        assert_eq!(second.len(), 1);
        assert!(second.get(&StreamLabel::new("a")).is_some());
        assert_eq!(set.active_count(), 1);

        set.read_all(&identity()).await.unwrap();
        let fourth = set.read_all(&identity()).await.unwrap();
        assert!(fourth.is_empty());
        assert!(set.is_exhausted());
        assert_eq!(set.positions(), vec![3, 1]);
    }

    #[tokio::test]
    async fn test_read_applies_processor() {
        let mut set = SourceSet::open(&opener(), &ids(&["a"])).await;
        let processor = FrameProcessor::new(2.0, ColorMode::Grayscale);

        let frames = set.read_all(&processor).await.unwrap();
        let frame = frames.get(&StreamLabel::new("a")).unwrap();
        assert_eq!((frame.width, frame.height), (1, 1));
        assert_eq!(frame.format, crate::media::PixelFormat::Gray8);
    }

    #[tokio::test]
    async fn test_release_all_idempotent() {
        let mut set = SourceSet::open(&opener(), &ids(&["a", "b"])).await;

        set.release_all();
        set.release_all();

        assert!(set.is_exhausted());
        let frames = set.read_all(&identity()).await.unwrap();
        assert!(frames.is_empty());
    }
}
