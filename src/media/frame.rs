//! Decoded frame types
//!
//! This module defines the image type handed around by the player and the
//! synchronized set of images captured for all streams at one tick.

use std::sync::Arc;

use bytes::Bytes;

/// Label identifying a stream (the identifier it was opened with)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamLabel(Arc<str>);

impl StreamLabel {
    /// Create a new stream label
    pub fn new(label: impl AsRef<str>) -> Self {
        Self(Arc::from(label.as_ref()))
    }

    /// Get the label as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StreamLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StreamLabel {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Pixel layout of a frame buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Packed 8-bit R, G, B
    Rgb24,
    /// 8-bit luma
    Gray8,
}

impl PixelFormat {
    /// Bytes per pixel
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgb24 => 3,
            PixelFormat::Gray8 => 1,
        }
    }

    /// Buffer size for a frame of the given dimensions
    pub fn buffer_size(&self, width: u32, height: u32) -> usize {
        width as usize * height as usize * self.bytes_per_pixel()
    }
}

/// A decoded image
///
/// This is designed to be cheap to clone due to `Bytes` reference counting:
/// the history cache and the display share one pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel layout of `data`
    pub format: PixelFormat,
    /// Row-major pixel data, no padding
    pub data: Bytes,
}

impl Frame {
    /// Create a frame, returning `None` if `data` does not match the dimensions
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Bytes) -> Option<Self> {
        if data.len() != format.buffer_size(width, height) {
            return None;
        }
        Some(Self {
            width,
            height,
            format,
            data,
        })
    }

    /// Create a packed RGB frame
    pub fn rgb(width: u32, height: u32, data: Bytes) -> Option<Self> {
        Self::new(width, height, PixelFormat::Rgb24, data)
    }

    /// Create a grayscale frame
    pub fn gray(width: u32, height: u32, data: Bytes) -> Option<Self> {
        Self::new(width, height, PixelFormat::Gray8, data)
    }

    /// RGB value of the pixel at (x, y)
    ///
    /// Grayscale pixels are replicated across all three channels.
    pub fn rgb_at(&self, x: u32, y: u32) -> (u8, u8, u8) {
        let idx = (y as usize * self.width as usize + x as usize) * self.format.bytes_per_pixel();
        match self.format {
            PixelFormat::Rgb24 => (self.data[idx], self.data[idx + 1], self.data[idx + 2]),
            PixelFormat::Gray8 => {
                let v = self.data[idx];
                (v, v, v)
            }
        }
    }
}

/// Frames from every stream that produced one at a single tick
///
/// Entries keep stream-registration order. Streams that reached end of
/// stream simply have no entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameSet {
    entries: Vec<(StreamLabel, Frame)>,
}

impl FrameSet {
    /// Create a frame set from ordered entries
    pub fn new(entries: Vec<(StreamLabel, Frame)>) -> Self {
        Self { entries }
    }

    /// Iterate over (label, frame) entries in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&StreamLabel, &Frame)> {
        self.entries.iter().map(|(l, f)| (l, f))
    }

    /// Get the frame for a stream
    pub fn get(&self, label: &StreamLabel) -> Option<&Frame> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, f)| f)
    }

    /// Labels present in this set
    pub fn labels(&self) -> impl Iterator<Item = &StreamLabel> {
        self.entries.iter().map(|(l, _)| l)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no stream produced a frame
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(StreamLabel, Frame)> for FrameSet {
    fn from_iter<I: IntoIterator<Item = (StreamLabel, Frame)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
