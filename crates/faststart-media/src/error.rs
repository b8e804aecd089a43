//! Error types for faststart-media.

use thiserror::Error;

/// Result type for faststart-media operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for box parsing, offset fixup and moov location.
#[derive(Debug, Error)]
pub enum Error {
    /// The data does not start with an `ftyp` box.
    #[error("Not an MP4 file: {0}")]
    NotMp4(String),

    /// A box header or box tree is structurally invalid.
    #[error("Malformed box: {0}")]
    MalformedBox(String),

    /// A declared size runs past the available data.
    #[error("Truncated box {box_type}: need {need} bytes, have {have}")]
    TruncatedBox {
        box_type: String,
        need: u64,
        have: u64,
    },

    /// The tail scan exhausted its window without a self-consistent moov header.
    #[error("Can't locate 'moov' box within {searched} bytes from EOF")]
    MoovNotFound { searched: u64 },

    /// A 32-bit chunk offset would no longer fit after relocation.
    #[error("Chunk offset {offset} + {delta} overflows {box_type} entry {index}")]
    OffsetOverflow {
        box_type: String,
        index: u32,
        offset: u64,
        delta: u64,
    },
}

impl Error {
    /// Create a not-MP4 error.
    pub fn not_mp4(msg: impl Into<String>) -> Self {
        Self::NotMp4(msg.into())
    }

    /// Create a malformed box error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedBox(msg.into())
    }

    /// Create a truncated box error.
    pub fn truncated(box_type: impl std::fmt::Display, need: u64, have: u64) -> Self {
        Self::TruncatedBox {
            box_type: box_type.to_string(),
            need,
            have,
        }
    }
}
