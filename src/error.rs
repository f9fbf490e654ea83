//! Error types
//!
//! Crate-wide error type and `Result` alias.

use std::fmt;
use std::io;

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for player operations
#[derive(Debug)]
pub enum Error {
    /// I/O error from a stream or the terminal
    Io(io::Error),
    /// Invalid configuration, rejected at startup
    Config(String),
    /// A stream could not be opened
    StreamOpen { stream: String, reason: String },
    /// A stream produced data that could not be decoded
    Decode { stream: String, reason: String },
    /// The state machine asked the history cache for an offset it does not hold.
    ///
    /// This is a defect, not an operator error.
    InvalidOffset { offset: isize, len: usize },
    /// The display sink failed
    Display(String),
}

impl Error {
    pub(crate) fn stream_open(stream: impl Into<String>, reason: impl ToString) -> Self {
        Error::StreamOpen {
            stream: stream.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn decode(stream: impl Into<String>, reason: impl ToString) -> Self {
        Error::Decode {
            stream: stream.into(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Config(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::StreamOpen { stream, reason } => {
                write!(f, "Cannot open stream {}: {}", stream, reason)
            }
            Error::Decode { stream, reason } => {
                write!(f, "Cannot decode stream {}: {}", stream, reason)
            }
            Error::InvalidOffset { offset, len } => {
                write!(f, "History offset {} out of range for {} cached frames", offset, len)
            }
            Error::Display(msg) => write!(f, "Display error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = Error::stream_open("a.y4m", "No such file");
        assert_eq!(err.to_string(), "Cannot open stream a.y4m: No such file");

        let err = Error::InvalidOffset { offset: -4, len: 3 };
        assert_eq!(
            err.to_string(),
            "History offset -4 out of range for 3 cached frames"
        );
    }

    #[test]
    fn test_io_source() {
        use std::error::Error as _;

        let err: Error = io::Error::new(io::ErrorKind::UnexpectedEof, "eof").into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.source().is_some());
        assert!(Error::Config("fps".into()).source().is_none());
    }
}
