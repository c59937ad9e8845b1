//! TIFF format parser.
//!
//! TIFF (Tagged Image File Format) structure:
//! - Header (8 bytes): byte order (II/MM) + magic (42 classic, 43 BigTIFF) + IFD0 offset
//! - IFD0: main image directory, chained to IFD1 (thumbnail)
//! - EXIF sub-IFD (tag 0x8769), GPS sub-IFD (tag 0x8825), Interop sub-IFD (tag 0xA005)
//!
//! Also recognizes TIFF-based camera RAW containers (CR2, NEF, ARW, ORF, RW2,
//! PEF, DNG, ...) purely by magic number; such files parse like any other
//! TIFF but are flagged read-only via [`crate::Metadata::is_camera_raw`].

use crate::utils::raw_value_to_attr;
use crate::{Error, FormatParser, Metadata, ReadSeek, Result};
use exiftool_core::model::DirType;
use exiftool_core::tiff_reader;
use exiftool_tags::{lookup_tag, TagGroup};

/// Configuration for TIFF-based format parsing.
#[derive(Clone)]
pub struct TiffConfig {
    /// Format name to report.
    pub format_name: &'static str,
}

impl Default for TiffConfig {
    fn default() -> Self {
        Self { format_name: "TIFF" }
    }
}

/// TIFF format parser.
///
/// Handles standard TIFF files and serves as the base for TIFF-based RAW
/// formats recognized purely by magic number.
pub struct TiffParser {
    config: TiffConfig,
}

impl TiffParser {
    /// Create parser with custom config (for RAW formats).
    pub fn with_config(config: TiffConfig) -> Self {
        Self { config }
    }
}

impl Default for TiffParser {
    fn default() -> Self {
        Self { config: TiffConfig::default() }
    }
}

impl FormatParser for TiffParser {
    fn can_parse(&self, header: &[u8]) -> bool {
        if header.len() < 4 {
            return false;
        }
        let is_tiff_le = header[0] == b'I' && header[1] == b'I' && header[2] == 0x2A && header[3] == 0x00;
        let is_tiff_be = header[0] == b'M' && header[1] == b'M' && header[2] == 0x00 && header[3] == 0x2A;
        let is_bigtiff_le = header[0] == b'I' && header[1] == b'I' && header[2] == 0x2B && header[3] == 0x00;
        let is_bigtiff_be = header[0] == b'M' && header[1] == b'M' && header[2] == 0x00 && header[3] == 0x2B;
        is_tiff_le || is_tiff_be || is_bigtiff_le || is_bigtiff_be
    }

    fn format_name(&self) -> &'static str {
        "TIFF"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["tif", "tiff", "dng", "nef", "cr2", "arw", "orf", "rw2", "pef"]
    }

    fn parse(&self, reader: &mut dyn ReadSeek) -> Result<Metadata> {
        let mut metadata = Metadata::new(self.config.format_name);
        let data = crate::utils::read_with_limit(reader)?;

        if data.len() < 8 {
            return Err(Error::InvalidStructure("TIFF file too small".into()));
        }

        let contents = tiff_reader::read_tiff(&data).map_err(Error::Core)?;
        if contents.header.is_bigtiff() {
            metadata.format = "BigTIFF";
        }

        if let Some(ifd0) = contents.directory(DirType::ROOT) {
            for field in &ifd0.fields {
                if let Some(def) = lookup_tag(field.tag, TagGroup::Ifd0) {
                    if let Ok(value) = field.decoded_value() {
                        metadata.exif.set(def.name, raw_value_to_attr(&value));
                    }
                }
            }
        }

        for (group, dir_type) in [
            (TagGroup::ExifIfd, DirType::EXIF),
            (TagGroup::GpsIfd, DirType::GPS),
            (TagGroup::InteropIfd, DirType::INTEROP),
        ] {
            if let Some(dir) = contents.directory(dir_type) {
                for field in &dir.fields {
                    if let Some(def) = lookup_tag(field.tag, group) {
                        if let Ok(value) = field.decoded_value() {
                            metadata.exif.set(def.name, raw_value_to_attr(&value));
                        }
                    }
                }
            }
        }

        if let Some(ifd1) = contents.directory(DirType::IFD1) {
            if let Some(thumb) = &ifd1.thumbnail {
                metadata.thumbnail = Some(thumb.data.clone());
            }
        }

        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_tiff_le() {
        let parser = TiffParser::default();
        assert!(parser.can_parse(&[b'I', b'I', 0x2A, 0x00]));
    }

    #[test]
    fn detect_tiff_be() {
        let parser = TiffParser::default();
        assert!(parser.can_parse(&[b'M', b'M', 0x00, 0x2A]));
    }

    #[test]
    fn detect_bigtiff_le() {
        let parser = TiffParser::default();
        assert!(parser.can_parse(&[b'I', b'I', 0x2B, 0x00]));
    }

    #[test]
    fn reject_jpeg() {
        let parser = TiffParser::default();
        assert!(!parser.can_parse(&[0xFF, 0xD8, 0xFF, 0xE0]));
    }

    #[test]
    fn parses_classic_tiff_with_orientation() {
        let data: Vec<u8> = vec![
            b'I', b'I', 0x2A, 0x00, 8, 0, 0, 0, // header, IFD0 @ 8
            1, 0, // 1 entry
            0x12, 0x01, // tag 0x0112 Orientation
            3, 0, // SHORT
            1, 0, 0, 0, // count 1
            6, 0, 0, 0, // value 6, inline
            0, 0, 0, 0, // next IFD = 0
        ];
        let parser = TiffParser::default();
        let mut cursor = std::io::Cursor::new(data);
        let metadata = parser.parse(&mut cursor).unwrap();
        assert_eq!(metadata.exif.get_str("Orientation"), None);
        assert!(metadata.exif.get("Orientation").is_some());
    }
}
