//! File format parsers for image metadata extraction.
//!
//! This crate provides a unified interface for reading and losslessly
//! rewriting metadata across the container formats this engine understands.
//!
//! # Supported Formats
//!
//! | Format | Extension | Parser | Writer |
//! |--------|-----------|--------|--------|
//! | JPEG | .jpg, .jpeg | [`JpegParser`] | [`JpegWriter`] |
//! | TIFF (and TIFF-based RAW) | .tiff, .tif, .dng, .nef, .cr2, ... | [`TiffParser`] | none (see [`Metadata::is_writable`]) |
//! | Fuji RAF | .raf | [`RafParser`] | [`RafWriter`] |
//! | HEIC/HEIF/AVIF | .heic, .heif, .avif | [`HeicParser`] | [`HeicWriter`] |
//! | JPEG XL | .jxl | [`JxlParser`] | [`JxlWriter`] |
//!
//! # Quick Start
//!
//! ```no_run
//! use exiftool_formats::{FormatRegistry, FormatParser};
//! use std::io::Cursor;
//!
//! let data = std::fs::read("photo.jpg").unwrap();
//!
//! let registry = FormatRegistry::new();
//! if let Some(parser) = registry.detect(&data[..16.min(data.len())]) {
//!     let mut cursor = Cursor::new(&data);
//!     let metadata = parser.parse(&mut cursor).unwrap();
//!     println!("Format: {}", metadata.format);
//! }
//! ```

mod clock;
mod coordinator;
mod error;
mod gps;
mod heic;
mod heic_writer;
mod iptc;
mod jpeg;
mod jpeg_writer;
mod jxl;
mod orientation;
mod raf;
mod raf_writer;
mod registry;
mod tiff;
mod traits;
mod utils;

pub use clock::{Clock, FixedZoneClock, SystemClock, ZoneProvider};
pub use coordinator::{apply_update, merge_metadata, ContainerKind};
pub use error::{Error, Result};
pub use heic::HeicParser;
pub use heic_writer::HeicWriter;
pub use jpeg::JpegParser;
pub use jpeg_writer::JpegWriter;
pub use jxl::{JxlParser, JxlWriter};
pub use raf::RafParser;
pub use raf_writer::RafWriter;
pub use registry::FormatRegistry;
pub use tiff::{TiffConfig, TiffParser};
pub use traits::{FormatParser, ReadSeek};
pub use utils::{read_with_limit, MAX_FILE_SIZE};

/// Metadata extracted from a file.
#[derive(Debug, Clone)]
#[must_use]
pub struct Metadata {
    /// File format name.
    pub format: &'static str,
    /// Parsed EXIF attributes.
    pub exif: exiftool_attrs::Attrs,
    /// Raw EXIF data offset in file.
    pub exif_offset: Option<usize>,
    /// XMP packet (if present).
    pub xmp: Option<String>,
    /// Thumbnail data (if present).
    pub thumbnail: Option<Vec<u8>>,
}

impl Metadata {
    /// Create new empty metadata.
    pub fn new(format: &'static str) -> Self {
        Self {
            format,
            exif: exiftool_attrs::Attrs::new(),
            exif_offset: None,
            xmp: None,
            thumbnail: None,
        }
    }

    /// True for TIFF-based RAW containers that are never written back.
    pub fn is_camera_raw(&self) -> bool {
        if self.format != "TIFF" {
            return false;
        }
        let Some(make) = self.exif.get_str("Make") else {
            return false;
        };
        let make_lower = make.to_lowercase();
        const RAW_VENDORS: &[&str] = &[
            "sony", "nikon", "canon", "fuji", "olympus", "panasonic", "pentax", "leica", "ricoh",
            "hasselblad", "phase one", "samsung",
        ];
        RAW_VENDORS.iter().any(|v| make_lower.contains(v))
    }

    /// Whether this format supports writing metadata back.
    ///
    /// Plain TIFF is parsed but has no writer: rewriting a TIFF container
    /// means relocating strip/tile pixel data around the new directory
    /// layout, which this engine doesn't implement.
    pub fn is_writable(&self) -> bool {
        const WRITABLE: &[&str] = &["JPEG", "RAF", "HEIC", "JXL"];
        WRITABLE.contains(&self.format) && !self.is_camera_raw()
    }
}
