//! EXIF tag catalog.
//!
//! Tag tables for:
//! - Standard EXIF tags (IFD0, ExifIFD, GPS, Interop)
//! - Value interpretation (PrintConv-style human-readable strings)

pub mod interp;
mod tags;

pub use tags::{lookup_tag, Multiplicity, TagDef, TagGroup, EXIF_TAGS, GPS_TAGS, IFD0_TAGS, INTEROP_TAGS};

/// Well-known writer-side tag ids re-exported from core.
pub use exiftool_core::tiff_writer::tags as well_known;
