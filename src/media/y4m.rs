//! YUV4MPEG2 stream parsing
//!
//! Y4M is a trivial uncompressed container: one text header line followed by
//! frames, each introduced by a `FRAME` line and carrying raw planar YUV.
//!
//! ```text
//! YUV4MPEG2 W704 H480 F30000:1001 Ip A1:1 C420jpeg\n
//! FRAME\n
//! <Y plane: W*H><U plane><V plane>
//! FRAME\n
//! ...
//! ```
//!
//! Frames are converted to packed RGB (BT.601, limited range); `Cmono`
//! streams become grayscale frames.

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use super::frame::{Frame, PixelFormat};

/// Stream signature that starts the header line
pub const SIGNATURE: &str = "YUV4MPEG2";

/// Frame marker that starts every frame line
pub const FRAME_MARKER: &str = "FRAME";

/// Longest header or frame line accepted
const MAX_LINE: u64 = 1024;

/// Largest width or height accepted in a header
pub const MAX_DIMENSION: u32 = 16384;

/// Error type for Y4M parsing
#[derive(Debug)]
pub enum Y4mError {
    /// Header does not start with the Y4M signature
    BadSignature,
    /// A header parameter could not be parsed
    BadParameter(String),
    /// Width or height missing from the header
    MissingDimension,
    /// Colour space not supported by the reader
    UnsupportedColorspace(String),
    /// A frame did not start with the `FRAME` marker
    BadFrameMarker,
    /// Header or frame line longer than allowed
    LineTooLong,
    /// Stream ended in the middle of a frame
    Truncated,
    /// Underlying I/O error
    Io(std::io::Error),
}

impl std::fmt::Display for Y4mError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Y4mError::BadSignature => write!(f, "Missing {} signature", SIGNATURE),
            Y4mError::BadParameter(p) => write!(f, "Bad header parameter: {}", p),
            Y4mError::MissingDimension => write!(f, "Header lacks width or height"),
            Y4mError::UnsupportedColorspace(c) => write!(f, "Unsupported colour space: {}", c),
            Y4mError::BadFrameMarker => write!(f, "Frame does not start with {}", FRAME_MARKER),
            Y4mError::LineTooLong => write!(f, "Header line too long"),
            Y4mError::Truncated => write!(f, "Stream ends inside a frame"),
            Y4mError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Y4mError {}

impl From<std::io::Error> for Y4mError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Y4mError::Truncated
        } else {
            Y4mError::Io(e)
        }
    }
}

/// Chroma layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colorspace {
    /// 4:2:0, any siting (`420`, `420jpeg`, `420paldv`, `420mpeg2`)
    C420,
    /// 4:2:2
    C422,
    /// 4:4:4
    C444,
    /// Luma only
    Mono,
}

impl Colorspace {
    fn parse(value: &str) -> Result<Self, Y4mError> {
        match value {
            "420" | "420jpeg" | "420paldv" | "420mpeg2" => Ok(Colorspace::C420),
            "422" => Ok(Colorspace::C422),
            "444" => Ok(Colorspace::C444),
            "mono" => Ok(Colorspace::Mono),
            other => Err(Y4mError::UnsupportedColorspace(other.to_string())),
        }
    }

    /// Width and height of each chroma plane
    fn chroma_size(&self, width: usize, height: usize) -> (usize, usize) {
        match self {
            Colorspace::C420 => (width.div_ceil(2), height.div_ceil(2)),
            Colorspace::C422 => (width.div_ceil(2), height),
            Colorspace::C444 => (width, height),
            Colorspace::Mono => (0, 0),
        }
    }
}

/// Parsed stream header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Y4mHeader {
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Frame rate as numerator/denominator, if declared
    pub frame_rate: Option<(u32, u32)>,
    /// Chroma layout (defaults to 4:2:0)
    pub colorspace: Colorspace,
}

impl Y4mHeader {
    /// Parse a header line (without the trailing newline)
    pub fn parse(line: &str) -> Result<Self, Y4mError> {
        let mut tokens = line.split_ascii_whitespace();
        if tokens.next() != Some(SIGNATURE) {
            return Err(Y4mError::BadSignature);
        }

        let mut width = None;
        let mut height = None;
        let mut frame_rate = None;
        let mut colorspace = Colorspace::C420;

        for token in tokens {
            let mut chars = token.chars();
            let tag = chars.next();
            let value = chars.as_str();
            match tag {
                Some('W') => width = Some(parse_dimension(token, value)?),
                Some('H') => height = Some(parse_dimension(token, value)?),
                Some('F') => frame_rate = Some(parse_ratio(token, value)?),
                Some('C') => colorspace = Colorspace::parse(value)?,
                // Interlacing, aspect ratio and extensions do not affect decoding
                _ => {}
            }
        }

        match (width, height) {
            (Some(width), Some(height)) => Ok(Self {
                width,
                height,
                frame_rate,
                colorspace,
            }),
            _ => Err(Y4mError::MissingDimension),
        }
    }

    /// Frame rate in frames per second, if declared
    pub fn fps(&self) -> Option<f64> {
        self.frame_rate.map(|(num, den)| num as f64 / den as f64)
    }

    /// Size of one frame's planar payload in bytes
    ///
    /// Fails for dimensions above [`MAX_DIMENSION`] or when the size does
    /// not fit in `usize`.
    pub fn frame_payload_size(&self) -> Result<usize, Y4mError> {
        if self.width > MAX_DIMENSION || self.height > MAX_DIMENSION {
            return Err(Y4mError::BadParameter(format!(
                "frame size {}x{} exceeds {}",
                self.width, self.height, MAX_DIMENSION
            )));
        }
        let (w, h) = (self.width as usize, self.height as usize);
        let (cw, ch) = self.colorspace.chroma_size(w, h);
        w.checked_mul(h)
            .zip(cw.checked_mul(ch).and_then(|c| c.checked_mul(2)))
            .and_then(|(luma, chroma)| luma.checked_add(chroma))
            .ok_or_else(|| {
                Y4mError::BadParameter(format!("frame size {}x{} overflows", w, h))
            })
    }
}

fn parse_dimension(token: &str, value: &str) -> Result<u32, Y4mError> {
    match value.parse::<u32>() {
        Ok(v) if v > 0 && v <= MAX_DIMENSION => Ok(v),
        _ => Err(Y4mError::BadParameter(token.to_string())),
    }
}

fn parse_ratio(token: &str, value: &str) -> Result<(u32, u32), Y4mError> {
    let bad = || Y4mError::BadParameter(token.to_string());
    let (num, den) = value.split_once(':').ok_or_else(bad)?;
    let num = num.parse::<u32>().map_err(|_| bad())?;
    let den = den.parse::<u32>().map_err(|_| bad())?;
    if den == 0 {
        return Err(bad());
    }
    Ok((num, den))
}

/// Frame-by-frame Y4M reader
#[derive(Debug)]
pub struct Y4mReader<R> {
    inner: R,
    header: Y4mHeader,
    /// Scratch buffer for one frame payload
    payload: Vec<u8>,
    frames_read: u64,
}

impl<R: AsyncBufRead + Unpin> Y4mReader<R> {
    /// Read and parse the stream header
    pub async fn open(mut inner: R) -> Result<Self, Y4mError> {
        let line = read_line(&mut inner).await?.ok_or(Y4mError::BadSignature)?;
        let header = Y4mHeader::parse(&line)?;
        let payload = vec![0u8; header.frame_payload_size()?];

        Ok(Self {
            inner,
            header,
            payload,
            frames_read: 0,
        })
    }

    /// Stream header
    pub fn header(&self) -> &Y4mHeader {
        &self.header
    }

    /// Number of frames decoded so far
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Read the next frame, or `None` at a clean end of stream
    pub async fn next_frame(&mut self) -> Result<Option<Frame>, Y4mError> {
        let line = match read_line(&mut self.inner).await? {
            Some(line) => line,
            None => return Ok(None),
        };
        if !line.starts_with(FRAME_MARKER) {
            return Err(Y4mError::BadFrameMarker);
        }

        self.inner.read_exact(&mut self.payload).await?;
        self.frames_read += 1;

        Ok(Some(convert(&self.header, &self.payload)))
    }
}

/// Read one `\n`-terminated line; `None` at end of stream
async fn read_line<R: AsyncBufRead + Unpin>(inner: &mut R) -> Result<Option<String>, Y4mError> {
    let mut buf = Vec::new();
    let n = inner.take(MAX_LINE).read_until(b'\n', &mut buf).await?;
    if n == 0 {
        return Ok(None);
    }
    if buf.last() != Some(&b'\n') {
        return Err(if n as u64 == MAX_LINE {
            Y4mError::LineTooLong
        } else {
            Y4mError::Truncated
        });
    }
    buf.pop();
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

/// Convert one planar payload into a frame
fn convert(header: &Y4mHeader, payload: &[u8]) -> Frame {
    let (w, h) = (header.width as usize, header.height as usize);
    let (luma, chroma) = payload.split_at(w * h);

    if header.colorspace == Colorspace::Mono {
        return Frame {
            width: header.width,
            height: header.height,
            format: PixelFormat::Gray8,
            data: Bytes::copy_from_slice(luma),
        };
    }

    let (cw, ch) = header.colorspace.chroma_size(w, h);
    let (u_plane, v_plane) = chroma.split_at(cw * ch);
    let mut out = BytesMut::with_capacity(w * h * 3);

    for y in 0..h {
        let cy = match header.colorspace {
            Colorspace::C420 => y / 2,
            _ => y,
        };
        for x in 0..w {
            let cx = match header.colorspace {
                Colorspace::C444 => x,
                _ => x / 2,
            };
            let ci = cy * cw + cx;
            let (r, g, b) = yuv_to_rgb(luma[y * w + x], u_plane[ci], v_plane[ci]);
            out.put_slice(&[r, g, b]);
        }
    }

    Frame {
        width: header.width,
        height: header.height,
        format: PixelFormat::Rgb24,
        data: out.freeze(),
    }
}

/// BT.601 limited-range YCbCr to RGB, integer approximation
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let c = y as i32 - 16;
    let d = u as i32 - 128;
    let e = v as i32 - 128;

    let clamp = |x: i32| x.clamp(0, 255) as u8;
    (
        clamp((298 * c + 409 * e + 128) >> 8),
        clamp((298 * c - 100 * d - 208 * e + 128) >> 8),
        clamp((298 * c + 516 * d + 128) >> 8),
    )
}
