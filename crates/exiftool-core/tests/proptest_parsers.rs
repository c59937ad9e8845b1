//! Property-based tests for core parsers.
//!
//! These tests verify that parsers handle arbitrary input without panicking.

use exiftool_core::tiff_reader::{parse_header, read_tiff};
use exiftool_core::{ByteOrder, ExifFormat};
use proptest::prelude::*;

proptest! {
    /// TIFF header parsing should never panic on arbitrary byte sequences.
    #[test]
    fn tiff_header_no_panic(data in prop::collection::vec(any::<u8>(), 0..1024)) {
        // Should return Ok or Err, never panic
        let _ = parse_header(&data);
    }

    /// Full IFD walk should never panic on arbitrary byte sequences.
    #[test]
    fn tiff_walk_no_panic(data in prop::collection::vec(any::<u8>(), 0..1024)) {
        let _ = read_tiff(&data);
    }

    /// ByteOrder::from_marker should handle any 2-byte input.
    #[test]
    fn byte_order_parse_no_panic(b0 in any::<u8>(), b1 in any::<u8>()) {
        let _ = ByteOrder::from_marker([b0, b1]);
    }

    /// ExifFormat::from_u16 should handle any u16 value.
    #[test]
    fn exif_format_from_u16_no_panic(val in any::<u16>()) {
        let _ = ExifFormat::from_u16(val);
    }

    /// Valid TIFF headers should parse correctly.
    #[test]
    fn valid_tiff_header_parses(offset in 8u32..0xFFFF_u32) {
        // Little-endian header
        let mut data = vec![0x49, 0x49, 0x2A, 0x00];
        data.extend_from_slice(&offset.to_le_bytes());
        // Pad to offset
        data.resize(offset as usize + 2, 0);

        let result = parse_header(&data);
        assert!(result.is_ok());
        assert_eq!(result.unwrap().first_ifd_offset, offset as u64);
    }
}

#[cfg(test)]
mod edge_cases {
    use exiftool_core::tiff_reader::parse_header;

    #[test]
    fn empty_data() {
        let data: &[u8] = &[];
        assert!(parse_header(data).is_err());
    }

    #[test]
    fn too_short_header() {
        let data = [0x49, 0x49, 0x2A]; // Missing offset
        assert!(parse_header(&data).is_err());
    }

    #[test]
    fn invalid_magic() {
        let data = [0x49, 0x49, 0x00, 0x00, 0x08, 0x00, 0x00, 0x00];
        assert!(parse_header(&data).is_err());
    }

    #[test]
    fn offset_beyond_data() {
        let data = [0x49, 0x49, 0x2A, 0x00, 0xFF, 0xFF, 0x00, 0x00];
        // Header parses, but the first-IFD offset is out of bounds.
        let result = parse_header(&data);
        assert!(result.is_ok());
        assert_eq!(result.unwrap().first_ifd_offset, 0xFFFF);
    }
}
