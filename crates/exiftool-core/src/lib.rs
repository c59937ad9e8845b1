//! Core types and the TIFF/EXIF engine for image metadata parsing.
//!
//! This crate provides the low-level primitives and the structural TIFF
//! engine shared by every container format upstream of it:
//!
//! - [`ByteOrder`] - Big/little endian byte order handling
//! - [`ExifFormat`] - EXIF field-type catalog (byte, ascii, short, long,
//!   rational, signed variants, undefined, float, double, IFD, BigTIFF
//!   64-bit variants)
//! - [`model`] - the `TiffContents`/`TiffOutputSet` structural tree
//! - [`tiff_reader`] - walks the IFD forest into a `TiffContents`
//! - [`tiff_writer`] - serialises a `TiffOutputSet` back to bytes
//! - [`RawValue`] - parsed raw values before type conversion
//!
//! # Example
//!
//! ```
//! use exiftool_core::{tiff_reader, model::DirType};
//!
//! let tiff_data = [
//!     0x49, 0x49,             // "II" = little-endian
//!     0x2A, 0x00,             // TIFF magic (42)
//!     0x08, 0x00, 0x00, 0x00, // IFD0 offset = 8
//!     0x00, 0x00,             // zero entries
//!     0x00, 0x00, 0x00, 0x00, // no next IFD
//! ];
//!
//! let contents = tiff_reader::read_tiff(&tiff_data).unwrap();
//! assert!(contents.directory(DirType::ROOT).is_some());
//! ```

mod byte_order;
mod error;
mod format;
pub mod model;
pub mod reader;
pub mod tiff_reader;
pub mod tiff_writer;
mod value;

pub use byte_order::ByteOrder;
pub use error::{Error, Result};
pub use format::ExifFormat;
pub use model::{DirType, MetadataUpdate, TiffContents, TiffDirectory, TiffField, TiffHeader};
pub use model::{TiffOutputDirectory, TiffOutputField, TiffOutputSet};
pub use value::{RawValue, SRational, URational};
