//! Error types for decoding, size input and metadata extraction.

use std::io;

/// Failure to turn a source image into a frame sequence.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("could not read source: {0}")]
    Io(#[from] io::Error),

    #[error("could not decode source: {0}")]
    Format(#[from] image::ImageError),

    /// The container decoded but yielded no frames at all.
    #[error("source contains no frames")]
    NoFrames,

    /// Target size would need more pixels per frame than allowed.
    #[error("target size {width}x{height} exceeds the limit of {max_area} pixels")]
    TooLarge { width: u32, height: u32, max_area: u64 },
}

/// Rejected content of the width/height fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidSizeInput {
    #[error("size field is not an integer: {0:?}")]
    NotANumber(String),

    #[error("size must be positive, got {0}")]
    NonPositive(i64),

    #[error("size {0} does not fit in a pixel dimension")]
    OutOfRange(i64),

    #[error("{width}x{height} exceeds the limit of {max_area} pixels")]
    AreaTooLarge { width: u32, height: u32, max_area: u64 },
}

/// Failure of the byte-level metadata extractor.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("could not read file: {0}")]
    Io(#[from] io::Error),

    #[error("file too small: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    #[error("not a GIF file (signature {0:?})")]
    InvalidSignature(String),

    #[error("unexpected end of data at offset {offset}")]
    UnexpectedEof { offset: usize },

    #[error("unknown block 0x{byte:02X} at offset {offset}")]
    UnknownBlock { byte: u8, offset: usize },
}

/// Crate level error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    InvalidSize(#[from] InvalidSizeInput),

    #[error(transparent)]
    Metadata(#[from] MetadataError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
