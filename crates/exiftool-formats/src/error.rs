//! Error types for format parsing.

use thiserror::Error;

/// Format parsing errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported format")]
    UnsupportedFormat,

    #[error("invalid file structure: {0}")]
    InvalidStructure(String),

    #[error("missing required segment: {0}")]
    MissingSegment(&'static str),

    #[error("core error: {0}")]
    Core(#[from] exiftool_core::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file too large: {0} bytes exceeds limit of {1} bytes")]
    FileTooLarge(u64, u64),

    /// A rewritten APP1 payload exceeds the 65534-byte segment-length
    /// ceiling (2-byte big-endian length field, minus the length field
    /// itself).
    #[error("EXIF payload too large: {0} bytes exceeds the {1}-byte APP1 limit")]
    ExifTooLarge(usize, usize),

    /// An ISO-BMFF EXIF rewrite would change the item's byte length,
    /// which would invalidate other items' `iloc` offsets; recomputing
    /// those is out of scope, so the update is rejected outright.
    #[error("EXIF item size changed ({0} -> {1} bytes); rewriting iloc offsets is unsupported")]
    IlocOffsetShift(usize, usize),

    #[error("XMP error: {0}")]
    Xmp(#[from] exiftool_xmp::Error),

    /// A write path that only handles rewriting an existing item (e.g. a
    /// HEIC EXIF item with no pre-existing `Exif` item to overwrite)
    /// rather than creating a brand-new one from scratch.
    #[error("unsupported write: {0}")]
    UnsupportedWrite(&'static str),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
