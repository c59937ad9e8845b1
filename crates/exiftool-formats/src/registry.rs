//! Format registry for auto-detection.
//!
//! Registered parsers:
//! - JpegParser - JPEG with EXIF/XMP/IPTC
//! - TiffParser - TIFF/DNG and TIFF-based RAW recognized purely by magic number
//! - RafParser - Fujifilm RAF
//! - HeicParser - HEIC/HEIF/AVIF (ISO-BMFF)
//! - JxlParser - JPEG XL

use crate::{FormatParser, HeicParser, JpegParser, JxlParser, RafParser, Result, TiffParser};

/// Registry of format parsers with auto-detection.
pub struct FormatRegistry {
    parsers: Vec<Box<dyn FormatParser>>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatRegistry {
    /// Create registry with all built-in parsers.
    pub fn new() -> Self {
        let mut r = Self { parsers: vec![] };
        // Order matters: more specific magic bytes first, generic TIFF last.
        r.register(Box::new(JpegParser));
        r.register(Box::new(RafParser)); // FUJIFILM magic
        r.register(Box::new(HeicParser::default())); // ISOBMFF with ftyp (heic/heif/avif)
        r.register(Box::new(JxlParser)); // JPEG XL codestream or ISOBMFF container
        r.register(Box::new(TiffParser::default())); // generic TIFF / TIFF-based RAW, last
        r
    }

    /// Register a format parser.
    pub fn register(&mut self, parser: Box<dyn FormatParser>) {
        self.parsers.push(parser);
    }

    /// Detect format from magic bytes (first 16 bytes recommended).
    pub fn detect(&self, header: &[u8]) -> Option<&dyn FormatParser> {
        self.parsers
            .iter()
            .find(|p| p.can_parse(header))
            .map(|p| p.as_ref())
    }

    /// Get parser by format name.
    pub fn get(&self, name: &str) -> Option<&dyn FormatParser> {
        self.parsers
            .iter()
            .find(|p| p.format_name().eq_ignore_ascii_case(name))
            .map(|p| p.as_ref())
    }

    /// Get parser by file extension.
    pub fn by_extension(&self, ext: &str) -> Option<&dyn FormatParser> {
        let ext_lower = ext.to_lowercase();
        self.parsers
            .iter()
            .find(|p| p.extensions().iter().any(|e| e.eq_ignore_ascii_case(&ext_lower)))
            .map(|p| p.as_ref())
    }

    /// Parse file with auto-detection.
    pub fn parse<R: std::io::Read + std::io::Seek>(&self, reader: &mut R) -> Result<crate::Metadata> {
        let mut header = [0u8; 16];
        reader.read_exact(&mut header)?;
        reader.seek(std::io::SeekFrom::Start(0))?;

        let parser = self.detect(&header).ok_or(crate::Error::UnsupportedFormat)?;

        parser.parse(reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_jpeg_by_magic() {
        let registry = FormatRegistry::new();
        let header = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(registry.detect(&header).unwrap().format_name(), "JPEG");
    }

    #[test]
    fn detects_tiff_last_as_fallback() {
        let registry = FormatRegistry::new();
        let header = [0x49, 0x49, 0x2A, 0, 8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(registry.detect(&header).unwrap().format_name(), "TIFF");
    }

    #[test]
    fn by_extension_is_case_insensitive() {
        let registry = FormatRegistry::new();
        assert_eq!(registry.by_extension("JPG").unwrap().format_name(), "JPEG");
    }
}
