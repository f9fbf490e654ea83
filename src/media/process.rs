//! Per-frame processing applied before caching
//!
//! Every freshly read frame is optionally converted to grayscale and then
//! downsampled by the configured scale factor. Scaling is nearest-neighbour.

use bytes::{BufMut, Bytes, BytesMut};

use super::frame::{Frame, PixelFormat};

/// Colour mode for displayed frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// Keep RGB
    #[default]
    Color,
    /// Convert to 8-bit luma
    Grayscale,
}

/// Grayscale conversion and downscaling
#[derive(Debug, Clone, Copy)]
pub struct FrameProcessor {
    /// Downsample factor (2.0 halves each dimension)
    scale: f64,
    /// Output colour mode
    color: ColorMode,
}

impl FrameProcessor {
    /// Create a processor
    ///
    /// `scale` must be positive and finite; configuration validation
    /// guarantees this for the player.
    pub fn new(scale: f64, color: ColorMode) -> Self {
        Self { scale, color }
    }

    /// Whether processing leaves frames untouched
    pub fn is_identity(&self) -> bool {
        self.scale == 1.0 && self.color == ColorMode::Color
    }

    /// Process one frame
    pub fn apply(&self, frame: Frame) -> Frame {
        let frame = match self.color {
            ColorMode::Grayscale if frame.format == PixelFormat::Rgb24 => to_gray(&frame),
            _ => frame,
        };

        if self.scale == 1.0 {
            return frame;
        }
        resize(&frame, self.scale)
    }
}

/// Output dimensions after downsampling by `scale`
pub fn scaled_size(width: u32, height: u32, scale: f64) -> (u32, u32) {
    let w = (width as f64 / scale).round().max(1.0) as u32;
    let h = (height as f64 / scale).round().max(1.0) as u32;
    (w, h)
}

/// BT.601 luma
fn to_gray(frame: &Frame) -> Frame {
    let mut out = BytesMut::with_capacity(frame.width as usize * frame.height as usize);
    for px in frame.data.chunks_exact(3) {
        let (r, g, b) = (px[0] as u32, px[1] as u32, px[2] as u32);
        out.put_u8(((299 * r + 587 * g + 114 * b + 500) / 1000) as u8);
    }
    Frame {
        width: frame.width,
        height: frame.height,
        format: PixelFormat::Gray8,
        data: out.freeze(),
    }
}

fn resize(frame: &Frame, scale: f64) -> Frame {
    let (out_w, out_h) = scaled_size(frame.width, frame.height, scale);
    let bpp = frame.format.bytes_per_pixel();
    let src_w = frame.width as usize;
    let mut out = BytesMut::with_capacity(frame.format.buffer_size(out_w, out_h));

    for y in 0..out_h as usize {
        let sy = sample(y, out_h as usize, frame.height as usize);
        for x in 0..out_w as usize {
            let sx = sample(x, out_w as usize, src_w);
            let idx = (sy * src_w + sx) * bpp;
            out.put_slice(&frame.data[idx..idx + bpp]);
        }
    }

    Frame {
        width: out_w,
        height: out_h,
        format: frame.format,
        data: out.freeze(),
    }
}

/// Source index for output index `i` (pixel-centre mapping)
fn sample(i: usize, out_len: usize, src_len: usize) -> usize {
    let pos = (2 * i + 1) * src_len / (2 * out_len);
    pos.min(src_len - 1)
}

/// Frame with every pixel set to one RGB value, for tests and placeholders
pub fn solid_rgb(width: u32, height: u32, rgb: (u8, u8, u8)) -> Frame {
    let mut out = BytesMut::with_capacity(PixelFormat::Rgb24.buffer_size(width, height));
    for _ in 0..width as usize * height as usize {
        out.put_slice(&[rgb.0, rgb.1, rgb.2]);
    }
    Frame {
        width,
        height,
        format: PixelFormat::Rgb24,
        data: Bytes::from(out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let processor = FrameProcessor::new(1.0, ColorMode::Color);
        assert!(processor.is_identity());

        let frame = solid_rgb(4, 2, (10, 20, 30));
        assert_eq!(processor.apply(frame.clone()), frame);
    }

    #[test]
    fn test_grayscale() {
        let processor = FrameProcessor::new(1.0, ColorMode::Grayscale);
        let out = processor.apply(solid_rgb(2, 2, (255, 255, 255)));

        assert_eq!(out.format, PixelFormat::Gray8);
        assert_eq!(out.data.len(), 4);
        assert!(out.data.iter().all(|&v| v == 255));

        let out = processor.apply(solid_rgb(1, 1, (255, 0, 0)));
        assert_eq!(out.data[0], 76);
    }

    #[test]
    fn test_downscale_halves() {
        let processor = FrameProcessor::new(2.0, ColorMode::Color);
        let out = processor.apply(solid_rgb(704, 480, (1, 2, 3)));

        assert_eq!((out.width, out.height), (352, 240));
        assert_eq!(out.data.len(), 352 * 240 * 3);
        assert_eq!(out.rgb_at(351, 239), (1, 2, 3));
    }

    #[test]
    fn test_downscale_picks_centre_samples() {
        let data = Bytes::from_static(&[0, 10, 20, 30]);
        let frame = Frame::gray(4, 1, data).unwrap();

        let out = FrameProcessor::new(2.0, ColorMode::Color).apply(frame);
        assert_eq!(out.width, 2);
        assert_eq!(&out.data[..], &[10, 30]);
    }

    #[test]
    fn test_upscale_when_scale_below_one() {
        let frame = Frame::gray(1, 1, Bytes::from_static(&[42])).unwrap();
        let out = FrameProcessor::new(0.5, ColorMode::Color).apply(frame);

        assert_eq!((out.width, out.height), (2, 2));
        assert!(out.data.iter().all(|&v| v == 42));
    }

    #[test]
    fn test_scaled_size_never_zero() {
        assert_eq!(scaled_size(3, 3, 100.0), (1, 1));
    }
}
