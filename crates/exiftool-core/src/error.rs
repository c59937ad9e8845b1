//! Error types for exiftool-core.

use thiserror::Error;

/// Core parsing errors.
#[derive(Debug, Error)]
#[must_use]
pub enum Error {
    #[error("unexpected end of data: need {need} bytes, have {have}")]
    UnexpectedEof { need: usize, have: usize },

    #[error("invalid TIFF magic: expected 0x002A or 0x002B, got 0x{0:04X}")]
    InvalidTiffMagic(u16),

    #[error("invalid byte order marker: expected 'II' or 'MM', got {0:?}")]
    InvalidByteOrder([u8; 2]),

    #[error("invalid EXIF format type: {0}")]
    InvalidFormat(u16),

    #[error("IFD offset {0} is out of bounds (max {1})")]
    IfdOffsetOutOfBounds(u32, usize),

    #[error("IFD entry count {0} exceeds maximum {1}")]
    TooManyIfdEntries(u16, u16),

    #[error("value offset {0} + size {1} exceeds data length {2}")]
    ValueOutOfBounds(u32, usize, usize),

    #[error("value size overflow: format size {format_size} * count {count} overflows")]
    ValueSizeOverflow { format_size: usize, count: u32 },

    #[error("IFD too large to serialize: size {0} exceeds u32::MAX")]
    IfdTooLarge(usize),

    #[error("recursive IFD reference detected at offset {0}")]
    RecursiveIfd(u32),

    #[error("no directories found in TIFF stream")]
    NoDirectories,

    #[error("missing required field: {0}")]
    MissingRequiredField(&'static str),

    #[error("field {name} type mismatch: expected {expected}, got {actual}")]
    FieldTypeMismatch { name: &'static str, expected: &'static str, actual: &'static str },

    #[error("field {0} has an unexpected element count")]
    FieldCountMismatch(&'static str),

    #[error("unknown field type code: {0}")]
    UnknownFieldType(u16),

    #[error("directory type {0} cannot be written (maker-note sub-trees are read-only)")]
    UnsupportedDirectory(i32),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for the entry/directory-level errors the TIFF reader absorbs by
    /// dropping the offending field or sub-directory rather than failing
    /// the whole parse.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::InvalidFormat(_)
                | Error::ValueOutOfBounds(..)
                | Error::ValueSizeOverflow { .. }
                | Error::IfdOffsetOutOfBounds(..)
                | Error::UnknownFieldType(_)
                | Error::RecursiveIfd(_)
        )
    }
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
