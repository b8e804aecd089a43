//! Error types for downloads.

use std::io;
use thiserror::Error;

/// Result type for download operations.
pub type Result<T> = std::result::Result<T, DownloadError>;

/// Error type for a single download.
///
/// Every variant is fatal for the download it came from.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Box-level failure from the MP4 codec or the tail scan.
    #[error(transparent)]
    Media(#[from] faststart_media::Error),

    /// The source can't report its length or doesn't support ranges.
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// The source returned something other than the requested window.
    #[error("Range mismatch: {0}")]
    RangeMismatch(String),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error while reading a body or writing the output.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Flat classification of [`DownloadError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotMp4,
    MalformedBox,
    TruncatedBox,
    MoovNotFound,
    OffsetOverflow,
    SourceUnavailable,
    RangeMismatch,
    Transport,
    Io,
}

impl DownloadError {
    /// Create a source unavailable error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::SourceUnavailable(msg.into())
    }

    /// Create a range mismatch error.
    pub fn range_mismatch(msg: impl Into<String>) -> Self {
        Self::RangeMismatch(msg.into())
    }

    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        use faststart_media::Error as Media;

        match self {
            Self::Media(Media::NotMp4(_)) => ErrorKind::NotMp4,
            Self::Media(Media::MalformedBox(_)) => ErrorKind::MalformedBox,
            Self::Media(Media::TruncatedBox { .. }) => ErrorKind::TruncatedBox,
            Self::Media(Media::MoovNotFound { .. }) => ErrorKind::MoovNotFound,
            Self::Media(Media::OffsetOverflow { .. }) => ErrorKind::OffsetOverflow,
            Self::SourceUnavailable(_) => ErrorKind::SourceUnavailable,
            Self::RangeMismatch(_) => ErrorKind::RangeMismatch,
            Self::Http(_) => ErrorKind::Transport,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Whether the remote file itself is not something we can rewrite,
    /// as opposed to a transport or local failure.
    pub fn is_nonconformant_source(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::NotMp4
                | ErrorKind::MalformedBox
                | ErrorKind::TruncatedBox
                | ErrorKind::MoovNotFound
                | ErrorKind::OffsetOverflow
        )
    }
}
